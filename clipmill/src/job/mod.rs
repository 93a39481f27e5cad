/// JSON job definition: the boundary object consumed by the CLI.
pub mod def;
