//! GenBase CLI
//!
//! Read-only command-line queries against a database directory.

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use genbase::{BaseFunc, Database, OpenOptions, Result};

/// GenBase CLI
#[derive(Parser, Debug)]
#[command(name = "genbase-cli")]
#[command(about = "CLI for querying a GenBase database")]
#[command(version)]
struct Args {
    /// Database directory
    #[arg(short, long, default_value = "./genbase_data")]
    base: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show database summary
    Info,

    /// Look up one person by exact key
    Key {
        /// First name
        first: String,

        /// Surname
        surname: String,

        /// Occurrence number among same-keyed persons
        #[arg(default_value = "0")]
        occ: i32,
    },

    /// Find every person indexed under a name
    Name {
        /// The name to search
        name: String,
    },

    /// Browse surnames in index order
    Surnames {
        /// Start browsing at the first surname >= this
        #[arg(default_value = "")]
        from: String,

        /// Number of surnames to list
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Print one person record
    Person {
        /// Person index
        iper: i32,
    },
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let options = OpenOptions::builder().read_only(true).build();
    let base = match Database::open(&args.base, options) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Cannot open {}: {}", args.base.display(), e);
            exit(1);
        }
    };

    if let Err(e) = run(&base, &args.command) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

fn run(base: &Database, command: &Commands) -> Result<()> {
    match command {
        Commands::Info => {
            println!("version:  {:?}", base.version());
            println!("origin:   {}", base.origin_file());
            println!("persons:  {}", base.nb_of_persons());
            println!("families: {}", base.nb_of_families());
            println!("strings:  {}", base.nb_of_strings());
        }
        Commands::Key { first, surname, occ } => {
            match base.person_of_key(first, surname, *occ)? {
                Some(iper) => print_person(base, iper)?,
                None => println!("No match for {} {} ({})", first, surname, occ),
            }
        }
        Commands::Name { name } => {
            let ipers = base.persons_of_name(name)?;
            if ipers.is_empty() {
                println!("No match for {}", name);
            }
            for iper in ipers {
                print_person(base, iper)?;
            }
        }
        Commands::Surnames { from, count } => {
            let mut cursor = base.surname_cursor(from)?;
            let mut left = *count;
            while let Some(istr) = cursor {
                if left == 0 {
                    break;
                }
                let ipers = base.persons_of_surname(istr)?;
                println!("{}  ({})", base.string_of(istr)?, ipers.len());
                cursor = base.surname_next(istr)?;
                left -= 1;
            }
        }
        Commands::Person { iper } => print_person(base, *iper)?,
    }
    Ok(())
}

fn print_person(base: &Database, iper: i32) -> Result<()> {
    let person = base.person(iper)?;
    let first = base.string_of(person.first_name)?;
    let surname = base.string_of(person.surname)?;
    println!("[{}] {} {} ({})", iper, first, surname, person.occ);
    let ascend = base.ascend(iper)?;
    if ascend.parents != genbase::records::DUMMY {
        let father = base.get_father(ascend.parents)?;
        let mother = base.get_mother(ascend.parents)?;
        println!("     parents: family {} ({}, {})", ascend.parents, father, mother);
    }
    for ifam in base.union_of(iper)?.families {
        let children = base.descend(ifam)?.children;
        println!("     union: family {} with {} children", ifam, children.len());
    }
    Ok(())
}
