//! agentdesk CLI — requirement-definition chat, secrets and workflow commands.
//!
//! Reuses the same core logic (agentdesk-core) and server bootstrap
//! (agentdesk-server) that back the HTTP API.

use agentdesk_cli::commands;
use clap::{Parser, Subcommand};

/// agentdesk CLI — define jobs by chat, run graph workflows
#[derive(Parser)]
#[command(name = "agentdesk", version, about = "agentdesk CLI — define jobs by chat, run graph workflows")]
pub struct Cli {
    /// Base URL of the agent API (chat and job creation)
    #[arg(long, env = "AGENT_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Server {
        /// Host to bind to (defaults to HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (defaults to PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Interactive requirement-definition chat
    Chat {
        /// Resume an existing conversation id
        #[arg(long)]
        conversation_id: Option<String>,
    },

    /// Create a job from a requirement set
    CreateJob {
        /// Conversation the requirements came from
        #[arg(long)]
        conversation_id: String,
        /// Requirements JSON, or @file.json
        #[arg(long)]
        requirements: String,
        /// Submit even when completeness is below the threshold
        #[arg(long)]
        force: bool,
    },

    /// Inspect secret resolution
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },

    /// Manage graph workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },
}

#[derive(Subcommand)]
enum SecretsAction {
    /// Resolve one secret
    Get {
        /// Secret key (e.g. OPENAI_API_KEY)
        key: String,
        /// Project (defaults to the vault's default project)
        #[arg(long)]
        project: Option<String>,
        /// Print the full value
        #[arg(long)]
        reveal: bool,
    },
    /// List all secrets available for a project
    List {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        reveal: bool,
    },
    /// Print the project used when none is given
    DefaultProject,
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// Check that a workflow file parses
    Validate {
        /// Path to the workflow YAML file
        file: String,
    },
    /// Register a workflow file under the model directory
    Register {
        /// Path to the workflow YAML file
        file: String,
        /// Workflow name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
        /// Sub-directory (category) to register into
        #[arg(long)]
        directory: Option<String>,
        /// Replace an existing workflow
        #[arg(long)]
        overwrite: bool,
    },
    /// Run a registered workflow
    Run {
        /// Model name, e.g. "tutorial/hello"
        model_name: String,
        /// User input for the source node
        #[arg(long)]
        input: String,
        /// Secrets project
        #[arg(long)]
        project: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "agentdesk_core=warn,agentdesk_server=info,agentdesk_cli=info".into()
                }),
        )
        .init();

    let settings = match commands::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let api_base = cli
        .api_base
        .clone()
        .unwrap_or_else(|| settings.agent_api_base.clone());

    let result = if let Some(command) = cli.command {
        match command {
            Commands::Server { host, port } => commands::server::run(settings, host, port).await,

            Commands::Chat { conversation_id } => {
                commands::chat::run(&api_base, conversation_id).await
            }

            Commands::CreateJob {
                conversation_id,
                requirements,
                force,
            } => commands::job::create(&api_base, &conversation_id, &requirements, force).await,

            Commands::Secrets { action } => match commands::init_state(settings) {
                Ok(state) => match action {
                    SecretsAction::Get {
                        key,
                        project,
                        reveal,
                    } => commands::secrets::get(&state, &key, project.as_deref(), reveal).await,
                    SecretsAction::List { project, reveal } => {
                        commands::secrets::list(&state, project.as_deref(), reveal).await
                    }
                    SecretsAction::DefaultProject => {
                        commands::secrets::default_project(&state).await
                    }
                },
                Err(e) => Err(e),
            },

            Commands::Workflow { action } => match action {
                WorkflowAction::Validate { file } => commands::workflow::validate(&file).await,
                WorkflowAction::Register {
                    file,
                    name,
                    directory,
                    overwrite,
                } => match commands::init_state(settings) {
                    Ok(state) => {
                        commands::workflow::register(
                            &state,
                            &file,
                            name.as_deref(),
                            directory.as_deref(),
                            overwrite,
                        )
                        .await
                    }
                    Err(e) => Err(e),
                },
                WorkflowAction::Run {
                    model_name,
                    input,
                    project,
                } => match commands::init_state(settings) {
                    Ok(state) => {
                        commands::workflow::run(&state, &model_name, &input, project.as_deref())
                            .await
                    }
                    Err(e) => Err(e),
                },
            },
        }
    } else {
        // No subcommand — show help
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        println!();
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
