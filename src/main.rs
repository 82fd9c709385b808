use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::api::ApiServerBuilder;
use parley::voice::{
    ConsoleSink, MicrophoneSource, SpeechSink, SpeechToText, SpokenSink, TextToSpeech,
    TranscriptionSource, TypedSource, run_conversation,
};
use parley::{ChatHandler, ChatSettings, Config, GeminiClient, LanguageModel};

/// Parley - talk to Gemini by voice or through a web page
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Echo messages instead of calling the model
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web page and chat API
    Serve {
        /// Address to bind
        #[arg(long, env = "PARLEY_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PARLEY_PORT")]
        port: Option<u16>,

        /// Show underlying model errors to clients
        #[arg(long)]
        debug: bool,
    },
    /// Talk through the microphone and speakers
    Listen {
        /// Type messages instead of speaking them
        #[arg(long)]
        typed: bool,

        /// Print replies without speaking them
        #[arg(long)]
        mute: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if cli.mock {
        config.mock = true;
    }

    match cli.command {
        Command::Serve { host, port, debug } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if debug {
                config.debug = true;
            }
            serve(config.for_server()).await
        }
        Command::Listen { typed, mute } => listen(&config, typed, mute).await,
    }
}

/// Build the chat handler, with a model client unless mocking
fn chat_handler(config: &Config) -> ChatHandler {
    let model = if config.mock {
        None
    } else {
        match GeminiClient::from_config(config) {
            Ok(client) => client.map(|c| Arc::new(c) as Arc<dyn LanguageModel>),
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize Gemini client");
                None
            }
        }
    };

    ChatHandler::new(ChatSettings::from(config), model)
}

/// Run the web variant
async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        model = %config.model,
        mock = config.mock,
        debug = config.debug,
        "starting parley web server"
    );

    let server = ApiServerBuilder::new(chat_handler(&config))
        .server_config(&config.server)
        .build();

    server.run().await?;
    Ok(())
}

/// Run the command-line variant
#[allow(clippy::future_not_send)]
async fn listen(config: &Config, typed: bool, mute: bool) -> anyhow::Result<()> {
    config.ensure_listen_ready(!typed, !mute)?;

    let chat = chat_handler(config);

    let mut source: Box<dyn TranscriptionSource> = if typed {
        Box::new(TypedSource::stdin())
    } else {
        Box::new(MicrophoneSource::new(SpeechToText::from_config(config)?)?)
    };

    let mut sink: Box<dyn SpeechSink> = if mute {
        Box::new(ConsoleSink)
    } else {
        Box::new(SpokenSink::new(TextToSpeech::from_config(config)?)?)
    };

    println!("Voice assistant started!");
    println!("Say 'exit', 'quit', or 'stop' to end the conversation.");

    let summary = run_conversation(source.as_mut(), &chat, sink.as_mut()).await;
    tracing::info!(
        turns = summary.turns,
        skipped = summary.skipped,
        failures = summary.failures,
        "conversation finished"
    );

    Ok(())
}
