use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lodge",
    about = "Lodge — dual-backend object store console",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a record from name=value tokens and persist it
    Create(CreateArgs),
    /// Print one record by kind and id
    Show(ShowArgs),
    /// List resident records, optionally of one kind
    All(AllArgs),
    /// Set one field on a record and persist it
    Update(UpdateArgs),
    /// Delete a record and persist the removal
    Destroy(DestroyArgs),
    /// Count resident records, optionally of one kind
    Count(CountArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    pub kind: String,
    /// name=value tokens; "quoted" values are text, underscores render
    /// as spaces, values with a decimal point are floats, other numeric
    /// values are integers
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub kind: String,
    pub id: String,
}

#[derive(Args)]
pub struct AllArgs {
    pub kind: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub kind: String,
    pub id: String,
    pub field: String,
    pub value: String,
}

#[derive(Args)]
pub struct DestroyArgs {
    pub kind: String,
    pub id: String,
}

#[derive(Args)]
pub struct CountArgs {
    pub kind: Option<String>,
}
