//! Stowbar Command-Line Interface
//!
//! Headless diagnostics for the menu bar core: list displays, check
//! permissions, capture the menu bar, forward clicks and edit the stored
//! icon layout.

mod colors;
mod commands;
mod exit_codes;
mod platform;

use clap::{Parser, Subcommand};
use exit_codes::ExitCode;
use tracing::debug;

/// Stowbar - menu bar diagnostics
#[derive(Parser, Debug)]
#[command(name = "stowbar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List connected displays
    Displays,
    /// Show permission status
    Permissions {
        /// Ask the OS for a permission first: accessibility, screen_recording
        #[arg(long, value_name = "TYPE")]
        request: Option<String>,
    },
    /// Capture the menu bar and slice it into icons
    Capture {
        /// Write the captured icons side by side to this PNG file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Click at a point (bottom-left origin, y up) and restore the pointer
    Click {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Right click instead of left
        #[arg(long)]
        right: bool,
    },
    /// Show or edit the stored icon layout
    Layout {
        #[command(subcommand)]
        action: LayoutAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
enum LayoutAction {
    /// Print icons per section in display order
    Show {
        /// Only this section: visible, hidden, alwaysHidden
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Move an icon to a section, adding it if unknown
    Move {
        /// Icon identifier
        id: String,

        /// Target section: visible, hidden, alwaysHidden
        section: String,

        /// Position within the section (default: end)
        #[arg(short, long)]
        index: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();
    stowbar_lib::logging::init_stderr_logging(if cli.verbose { "debug" } else { "warn" });

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", colors::error(&format!("Failed to create runtime: {}", e)));
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let exit_code = runtime.block_on(run(cli));
    debug!("Exiting with {} ({})", exit_code.as_i32(), exit_code);
    std::process::exit(exit_code.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Displays => commands::list_displays(cli.json, cli.quiet).await,
        Commands::Permissions { request } => {
            commands::permissions(request, cli.json, cli.quiet).await
        }
        Commands::Capture { output } => commands::capture(output, cli.json, cli.quiet).await,
        Commands::Click { x, y, right } => {
            commands::click(x, y, right, cli.json, cli.quiet).await
        }
        Commands::Layout { action } => match action {
            LayoutAction::Show { section } => commands::layout_show(section, cli.json, cli.quiet),
            LayoutAction::Move { id, section, index } => {
                commands::layout_move(id, section, index, cli.json, cli.quiet)
            }
        },
        Commands::Version => {
            commands::version(cli.json);
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify the CLI definition is valid
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_displays() {
        let cli = Cli::try_parse_from(["stowbar", "displays"]).unwrap();
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Displays));
    }

    #[test]
    fn parse_permissions_with_request() {
        let cli =
            Cli::try_parse_from(["stowbar", "permissions", "--request", "screen_recording"]).unwrap();
        match cli.command {
            Commands::Permissions { request } => {
                assert_eq!(request.as_deref(), Some("screen_recording"));
            }
            _ => panic!("Expected Permissions command"),
        }
    }

    #[test]
    fn parse_permissions_without_request() {
        let cli = Cli::try_parse_from(["stowbar", "permissions"]).unwrap();
        assert!(matches!(cli.command, Commands::Permissions { request: None }));
    }

    #[test]
    fn parse_capture_with_output() {
        let cli = Cli::try_parse_from(["stowbar", "capture", "-o", "/tmp/icons.png"]).unwrap();
        match cli.command {
            Commands::Capture { output } => {
                assert_eq!(output, Some("/tmp/icons.png".to_string()));
            }
            _ => panic!("Expected Capture command"),
        }
    }

    #[test]
    fn parse_click() {
        let cli = Cli::try_parse_from(["stowbar", "click", "--x", "1200.5", "--y", "888"]).unwrap();
        match cli.command {
            Commands::Click { x, y, right } => {
                assert_eq!(x, 1200.5);
                assert_eq!(y, 888.0);
                assert!(!right);
            }
            _ => panic!("Expected Click command"),
        }
    }

    /// Secondary displays left of the primary have negative x
    #[test]
    fn parse_click_negative_right() {
        let cli =
            Cli::try_parse_from(["stowbar", "click", "--x", "-300", "--y", "1050", "--right"])
                .unwrap();
        match cli.command {
            Commands::Click { x, right, .. } => {
                assert_eq!(x, -300.0);
                assert!(right);
            }
            _ => panic!("Expected Click command"),
        }
    }

    #[test]
    fn parse_click_missing_coordinate() {
        let result = Cli::try_parse_from(["stowbar", "click", "--x", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_layout_show_section() {
        let cli = Cli::try_parse_from(["stowbar", "layout", "show", "--section", "hidden"]).unwrap();
        match cli.command {
            Commands::Layout {
                action: LayoutAction::Show { section },
            } => assert_eq!(section.as_deref(), Some("hidden")),
            _ => panic!("Expected Layout Show command"),
        }
    }

    #[test]
    fn parse_layout_move() {
        let cli = Cli::try_parse_from([
            "stowbar",
            "layout",
            "move",
            "com.example.clock",
            "alwaysHidden",
            "--index",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Layout {
                action: LayoutAction::Move { id, section, index },
            } => {
                assert_eq!(id, "com.example.clock");
                assert_eq!(section, "alwaysHidden");
                assert_eq!(index, Some(2));
            }
            _ => panic!("Expected Layout Move command"),
        }
    }

    #[test]
    fn parse_layout_move_missing_section() {
        let result = Cli::try_parse_from(["stowbar", "layout", "move", "com.example.clock"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_version() {
        let cli = Cli::try_parse_from(["stowbar", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    /// Test that global flags work after subcommand
    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stowbar", "displays", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    #[test]
    fn parse_invalid_command() {
        let result = Cli::try_parse_from(["stowbar", "record"]);
        assert!(result.is_err());
    }
}
