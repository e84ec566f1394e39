//! Command-line demo for graphlayer.
//!
//! # Usage
//!
//! ```bash
//! # List every book with its author
//! graphlayer books
//!
//! # List comedies without authors, on one line
//! graphlayer --compact books --genre comedy --no-author
//!
//! # List authors
//! graphlayer authors
//!
//! # Describe the schema
//! graphlayer schema
//! graphlayer schema --json
//! ```

pub mod bookshop;

use bookshop::{Bookshop, BookshopGraph};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use graphlayer_schema::{Schema, TypeDef};
use miette::IntoDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "graphlayer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Genre {
    Comedy,
    Drama,
}

impl Genre {
    /// The domain value stored in the bookshop.
    pub fn domain_value(self) -> &'static str {
        match self {
            Self::Comedy => "comedy",
            Self::Drama => "drama",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List books
    Books {
        /// Only list books of this genre
        #[arg(short, long, value_enum)]
        genre: Option<Genre>,

        /// Do not look up authors
        #[arg(long)]
        no_author: bool,
    },

    /// List authors
    Authors,

    /// Describe the bookshop schema
    Schema {
        /// Print the schema as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Runs a command against the sample bookshop.
pub fn run(cli: Cli) -> miette::Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let graph = BookshopGraph::new()?;
    match cli.command {
        Commands::Books { genre, no_author } => {
            let query = graph.books_query(genre.map(Genre::domain_value), !no_author)?;
            let result = graph.execute(&Bookshop::sample(), &query)?;
            print_json(&result, cli.compact)
        }
        Commands::Authors => {
            let query = graph.authors_query()?;
            let result = graph.execute(&Bookshop::sample(), &query)?;
            print_json(&result, cli.compact)
        }
        Commands::Schema { json: true } => {
            let schema = serde_json::to_value(graph.schema()).into_diagnostic()?;
            print_json(&schema, cli.compact)
        }
        Commands::Schema { json: false } => {
            print!("{}", describe_schema(graph.schema()));
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value, compact: bool) -> miette::Result<()> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .into_diagnostic()?;
    println!("{text}");
    Ok(())
}

/// Renders the user-defined types of a schema, one block per type.
pub fn describe_schema(schema: &Schema) -> String {
    let mut out = String::new();
    for (name, def) in schema.types() {
        match def {
            TypeDef::Scalar(_) => {}
            TypeDef::Enum(ty) => {
                out.push_str(&format!("{} {}\n", "enum".blue().bold(), name.bold()));
                for (_, external) in ty.values() {
                    out.push_str(&format!("  {external}\n"));
                }
            }
            TypeDef::Object(ty) | TypeDef::Interface(ty) => {
                let keyword = if ty.is_interface() { "interface" } else { "type" };
                out.push_str(&format!("{} {}\n", keyword.blue().bold(), name.bold()));
                for field in ty.fields() {
                    let params = field
                        .params
                        .iter()
                        .map(|param| format!("{}: {}", param.name, param.ty))
                        .collect::<Vec<_>>();
                    let params = if params.is_empty() {
                        String::new()
                    } else {
                        format!("({})", params.join(", "))
                    };
                    out.push_str(&format!(
                        "  {}{}: {}\n",
                        field.name,
                        params,
                        field.ty.to_string().green()
                    ));
                }
            }
            TypeDef::InputObject(ty) => {
                out.push_str(&format!("{} {}\n", "input".blue().bold(), name.bold()));
                for field in ty.fields() {
                    out.push_str(&format!("  {}: {}\n", field.name, field.ty.to_string().green()));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_books_command() {
        let cli = Cli::parse_from(["graphlayer", "--compact", "books", "--genre", "drama"]);
        assert!(cli.compact);
        match cli.command {
            Commands::Books { genre, no_author } => {
                assert_eq!(genre, Some(Genre::Drama));
                assert!(!no_author);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_describe_schema_lists_user_types() {
        colored::control::set_override(false);
        let schema = bookshop::schema().unwrap();
        let description = describe_schema(&schema);

        assert!(description.contains("enum Genre\n  COMEDY\n  DRAMA\n"));
        assert!(description.contains("  books(genre: Option<Genre>): List<Book>\n"));
        assert!(!description.contains("Boolean"));
    }
}
