//! Interactive command loop
//!
//! Reads lines from the user, maps the first word to a [`Command`], and runs it
//! against the [`Session`], which carries the pagination cursors and the
//! caught pokemon between commands.

use std::io::Write;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::data::{PokeApiClient, PokeApiError};
use crate::pokedex::{attempt_catch, Pokedex};

/// Prompt shown before each line of input
pub const PROMPT: &str = "Pokedex > ";

/// Errors produced while running a command
#[derive(Debug, Error)]
pub enum CommandError {
    /// A command that needs an argument was called without one
    #[error("you need to provide {0}")]
    MissingArgument(&'static str),

    /// The API call behind the command failed
    #[error(transparent)]
    Api(#[from] PokeApiError),

    /// Writing output failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Commands understood by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Map,
    MapBack,
    Explore,
    Catch,
    Inspect,
    Pokedex,
}

impl Command {
    /// All commands in the order `help` lists them
    pub const ALL: [Command; 8] = [
        Command::Help,
        Command::Exit,
        Command::Map,
        Command::MapBack,
        Command::Explore,
        Command::Catch,
        Command::Inspect,
        Command::Pokedex,
    ];

    /// Word typed to invoke the command
    pub fn name(self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Exit => "exit",
            Command::Map => "map",
            Command::MapBack => "mapb",
            Command::Explore => "explore",
            Command::Catch => "catch",
            Command::Inspect => "inspect",
            Command::Pokedex => "pokedex",
        }
    }

    /// One-line description shown by `help`
    pub fn description(self) -> &'static str {
        match self {
            Command::Help => "Displays a help message",
            Command::Exit => "Exit the Pokedex",
            Command::Map => "Displays the next 20 location areas",
            Command::MapBack => "Displays the previous 20 location areas",
            Command::Explore => "Lists the pokemon found in a location area: explore <area>",
            Command::Catch => "Throws a Pokeball at a pokemon: catch <pokemon>",
            Command::Inspect => "Shows details of a caught pokemon: inspect <pokemon>",
            Command::Pokedex => "Lists all caught pokemon",
        }
    }

    /// Looks up a command by the word typed
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

/// Whether the loop should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Splits input into lowercase words, dropping surrounding whitespace
pub fn clean_input(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_lowercase).collect()
}

/// State carried between commands
pub struct Session {
    client: PokeApiClient,
    /// URL of the page after the one last shown
    next: Option<String>,
    /// URL of the page before the one last shown
    previous: Option<String>,
    /// Whether any location-area page has been shown yet
    started: bool,
    pokedex: Pokedex,
}

impl Session {
    pub fn new(client: PokeApiClient) -> Self {
        Self {
            client,
            next: None,
            previous: None,
            started: false,
            pokedex: Pokedex::new(),
        }
    }

    pub fn client(&self) -> &PokeApiClient {
        &self.client
    }

    pub fn pokedex(&self) -> &Pokedex {
        &self.pokedex
    }

    /// Runs one command
    ///
    /// # Arguments
    /// * `command` - The command to run
    /// * `args` - Words typed after the command name
    /// * `out` - Where user-facing output is written
    ///
    /// # Returns
    /// * `Ok(Flow::Exit)` if the user asked to leave
    /// * `Ok(Flow::Continue)` otherwise
    /// * `Err(CommandError)` if the command could not complete
    pub async fn execute<W: Write>(
        &mut self,
        command: Command,
        args: &[String],
        out: &mut W,
    ) -> Result<Flow, CommandError> {
        match command {
            Command::Help => self.help(out)?,
            Command::Exit => {
                writeln!(out, "Closing the Pokedex... Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Command::Map => self.map_forward(out).await?,
            Command::MapBack => self.map_back(out).await?,
            Command::Explore => {
                let area = first_arg(args, "a location area name to explore")?;
                self.explore(area, out).await?;
            }
            Command::Catch => {
                let name = first_arg(args, "a pokemon name to catch")?;
                self.catch(name, out).await?;
            }
            Command::Inspect => {
                let name = first_arg(args, "a pokemon name to inspect")?;
                self.inspect(name, out)?;
            }
            Command::Pokedex => self.list_pokedex(out)?,
        }
        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Welcome to the Pokedex!")?;
        writeln!(out, "Usage:")?;
        writeln!(out)?;
        for command in Command::ALL {
            writeln!(out, "{}: {}", command.name(), command.description())?;
        }
        Ok(())
    }

    async fn map_forward<W: Write>(&mut self, out: &mut W) -> Result<(), CommandError> {
        let url = if self.started {
            match self.next.clone() {
                Some(url) => Some(url),
                None => {
                    writeln!(out, "you're on the last page")?;
                    return Ok(());
                }
            }
        } else {
            None
        };
        self.show_page(url.as_deref(), out).await
    }

    async fn map_back<W: Write>(&mut self, out: &mut W) -> Result<(), CommandError> {
        match self.previous.clone() {
            Some(url) => self.show_page(Some(url.as_str()), out).await,
            None => {
                writeln!(out, "you're on the first page")?;
                Ok(())
            }
        }
    }

    async fn show_page<W: Write>(&mut self, url: Option<&str>, out: &mut W) -> Result<(), CommandError> {
        let page = self.client.location_areas(url).await?;

        for area in &page.results {
            writeln!(out, "{}", area.name)?;
        }
        self.next = page.next;
        self.previous = page.previous;
        self.started = true;
        Ok(())
    }

    async fn explore<W: Write>(&mut self, area: &str, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Exploring {}...", area)?;
        let location = self.client.location_area(area).await?;

        writeln!(out, "Found Pokemon:")?;
        for encounter in &location.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        Ok(())
    }

    async fn catch<W: Write>(&mut self, name: &str, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Throwing a Pokeball at {}...", name)?;
        let pokemon = self.client.pokemon(name).await?;

        let base_experience = pokemon.base_experience.unwrap_or(0);
        if attempt_catch(&mut rand::thread_rng(), base_experience) {
            writeln!(out, "{} was caught!", pokemon.name)?;
            writeln!(out, "You may now inspect it with the inspect command.")?;
            tracing::info!(pokemon = %pokemon.name, base_experience, "Pokemon caught");
            self.pokedex.insert(pokemon);
        } else {
            writeln!(out, "{} escaped!", pokemon.name)?;
        }
        Ok(())
    }

    fn inspect<W: Write>(&self, name: &str, out: &mut W) -> Result<(), CommandError> {
        let Some(caught) = self.pokedex.get(name) else {
            writeln!(out, "you have not caught that pokemon")?;
            return Ok(());
        };
        let pokemon = &caught.pokemon;

        writeln!(out, "Name: {}", pokemon.name)?;
        writeln!(out, "Height: {}", pokemon.height)?;
        writeln!(out, "Weight: {}", pokemon.weight)?;
        writeln!(out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(out, "  -{}: {}", stat.stat.name, stat.base_stat)?;
        }
        writeln!(out, "Types:")?;
        for pokemon_type in &pokemon.types {
            writeln!(out, "  - {}", pokemon_type.kind.name)?;
        }
        writeln!(out, "Caught: {}", caught.caught_at.format("%Y-%m-%d %H:%M:%S"))?;
        Ok(())
    }

    fn list_pokedex<W: Write>(&self, out: &mut W) -> Result<(), CommandError> {
        writeln!(out, "Your pokedex:")?;
        for caught in self.pokedex.iter() {
            writeln!(out, "  - {}", caught.pokemon.name)?;
        }
        Ok(())
    }
}

fn first_arg<'a>(args: &'a [String], what: &'static str) -> Result<&'a str, CommandError> {
    args.first()
        .map(String::as_str)
        .ok_or(CommandError::MissingArgument(what))
}

/// Runs the prompt loop until `exit` or end of input
///
/// Command failures are printed and the loop keeps going. Only a failure to
/// read input or write output ends the loop with an error.
pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let words = clean_input(&line);
        let Some((name, args)) = words.split_first() else {
            continue;
        };

        let Some(command) = Command::from_name(name) else {
            writeln!(out, "Unknown command")?;
            continue;
        };

        tracing::debug!(command = command.name(), ?args, "Running command");
        match session.execute(command, args, out).await {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(CommandError::Io(err)) => return Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "Command failed");
                writeln!(out, "{}", err)?;
            }
        }
    }

    Ok(())
}
