#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Vela plugin for sending build information by email

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use vela_email::{
    domain::notifications::{
        BuildEnv, BuildTimestamps, EnvironmentTable, NotificationService,
        NotificationServiceImpl, ProcessEnvironment,
    },
    infrastructure::{
        aliases,
        email::{
            parameters::{BuildConfig, EmailParameters},
            smtp::{SMTPConfig, SMTPMailer},
        },
        logging::LogConfig,
        version::Version,
    },
};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
#[command(name = "vela-email", version, about)]
pub struct Args {
    /// Logging configuration
    #[clap(flatten)]
    pub log: LogConfig,

    /// The email to send
    #[clap(flatten)]
    pub email: EmailParameters,

    /// The SMTP server and how to reach it
    #[clap(flatten)]
    pub smtp: SMTPConfig,

    /// Build timestamps
    #[clap(flatten)]
    pub build: BuildConfig,
}

#[mutants::skip]
fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load environment: {}", e);

            return Err(e.into());
        }
    }

    println!("{}", Version::new().to_json()?);

    aliases::apply();

    let args = Args::parse();

    args.log.init();

    info!(
        code = "https://github.com/go-vela/vela-email",
        docs = "https://go-vela.github.io/docs/plugins/registry/pipeline/email/",
        registry = "https://hub.docker.com/r/target/vela-email",
        "Vela Email Plugin"
    );

    let build = BuildEnv::from(BuildTimestamps::from(&args.build));
    let environment = EnvironmentTable::capture(&ProcessEnvironment, &build);

    let service = NotificationServiceImpl::new(
        Arc::new(SMTPMailer::new()),
        environment,
        args.smtp.endpoint(),
        args.smtp.transport(),
    );

    if let Err(e) = service.notify(args.email.notification()) {
        error!("{e}");

        return Err(e.into());
    }

    info!("Plugin finished");

    Ok(())
}
