use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell, output: Option<&Path>) -> Result<(), CliError> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            write_completions(shell, &mut command, &name, &mut file);
        }
        None => {
            write_completions(shell, &mut command, &name, &mut io::stdout());
        }
    }
    Ok(())
}

fn write_completions(
    shell: CompletionShell,
    command: &mut clap::Command,
    name: &str,
    writer: &mut dyn Write,
) {
    match shell {
        CompletionShell::Bash => generate(shells::Bash, command, name, writer),
        CompletionShell::Zsh => generate(shells::Zsh, command, name, writer),
        CompletionShell::Fish => generate(shells::Fish, command, name, writer),
    }
}
