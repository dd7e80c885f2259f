use storyloom_core::StoryloomConfig;

use super::ollama_client;

pub async fn list(config: &StoryloomConfig) -> anyhow::Result<()> {
    let client = ollama_client(config)?;
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("No models installed on {}", client.host());
        return Ok(());
    }

    println!("Models on {}:\n", client.host());
    for model in models {
        let family = model
            .details
            .as_ref()
            .and_then(|d| d.family.as_deref())
            .unwrap_or("-");
        println!("  {:<32} {:>10}  {}", model.name, format_size(model.size), family);
    }

    let configured = [
        ("generation", &config.ollama.generation_model),
        ("embedding", &config.ollama.embedding_model),
    ];
    println!();
    for (role, name) in configured {
        println!("  {} model: {}", role, name);
    }

    Ok(())
}

pub async fn pull(name: &str, config: &StoryloomConfig) -> anyhow::Result<()> {
    let client = ollama_client(config)?;
    println!("Pulling {} (this may take a while)...", name);
    let response = client.pull_model(name).await?;
    println!("✓ {}: {}", name, response.status);
    Ok(())
}

pub async fn delete(name: &str, config: &StoryloomConfig) -> anyhow::Result<()> {
    let client = ollama_client(config)?;
    client.delete_model(name).await?;
    println!("✓ Deleted {}", name);
    Ok(())
}

pub async fn version(config: &StoryloomConfig) -> anyhow::Result<()> {
    let client = ollama_client(config)?;
    println!("Ollama {} at {}", client.version().await?, client.host());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1e9)
    } else {
        format!("{} MB", bytes / 1_000_000)
    }
}
