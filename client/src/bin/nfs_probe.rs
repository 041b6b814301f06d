use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};

use nfstest_client::{config::ClientConfig, environment::Environment, logger::setup_logger};

/// Check that an NFSv3 server answers and that its export can be mounted.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(name = "nfs_probe", version)]
#[command(styles = nfstest_client::get_cli_styles())]
pub struct Config {
    #[clap(flatten)]
    #[serde(default)]
    pub client: ClientConfig,
    /// Disable colors in logs
    #[clap(long)]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Unmount the export once the root file handle was read
    #[clap(long)]
    #[serde(default)]
    pub unmount: bool,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config).context("Error while serializing config file")?;
            file.write_all(json.as_bytes()).context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
    } else if config.generate_config_template {
        eprintln!("Provided config file path is required to generate the template with --config-file");
        return Ok(());
    }

    setup_logger(config.client.log_level, config.disable_log_color)
        .context("Error while setting up the logger")?;

    let env = Environment::new(config.client.clone()).context("Invalid client configuration")?;
    if log::log_enabled!(log::Level::Info) {
        info!("Probing {}:{} export {}", env.host(), env.port(), env.export());
    }

    let client = env.connect().await.context("Error while resolving the server ports")?;
    client.null().await.context("NFSv3 NULL call failed")?;
    client.mount().null().await.context("MOUNT NULL call failed")?;

    match client.mount_root(env.export()).await {
        Ok(fh) => {
            println!("{} root file handle: {}", env.export(), hex::encode(&fh));
        }
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    }

    if config.unmount {
        client.mount().umnt(env.export()).await.context("Unmount failed")?;
    }
    client.close().await;

    Ok(())
}
