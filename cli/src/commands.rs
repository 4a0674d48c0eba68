pub mod setup;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Continue the setup of a freshly created service, offering its first deployment
    Setup(setup::SetupCommand),
}
