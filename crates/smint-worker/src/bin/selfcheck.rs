use std::path::Path;
use std::process::Command;

use smint_worker::{PipelineConfig, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env()?;

    println!(
        "smint-selfcheck: starting with work_dir={} dry_run={}",
        config.work_dir.display(),
        config.dry_run
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_transcoder(&config.ffmpeg_path)?;
    ServiceConfig::from_env(config.dry_run)?;

    println!("smint-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".smint-selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("work dir {} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_transcoder(program: &str) -> anyhow::Result<()> {
    let resolved = smint_media::check_transcoder(program)?;
    let output = Command::new(&resolved)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", program, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("{} -version failed: {:?}", program, output.status));
    }
    Ok(())
}
