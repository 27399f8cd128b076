use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Course enrollment - register, drop and swap course indexes
#[derive(Parser)]
#[command(name = "enrollment")]
#[command(about = "Student course registration against a text-file course store")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory from the configuration
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Account to log in as
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Account password; read from ENROLLMENT_PASSWORD when omitted
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register for an index, or join its waitlist when full
    Add {
        #[arg(short, long)]
        index: String,
    },
    /// Drop a registered or waitlisted index
    Drop {
        #[arg(short, long)]
        index: String,
    },
    /// Move to another index of the same course
    Change {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Exchange indexes with another student of the same course
    Swap {
        /// Your current index
        #[arg(short, long)]
        index: String,
        /// The other student's username
        #[arg(long)]
        peer: String,
        /// The other student's current index
        #[arg(long)]
        peer_index: String,
    },
    /// Show free seats on an index
    Vacancy {
        #[arg(short, long)]
        index: String,
    },
    /// Show your registered and waitlisted courses
    Courses,
    /// (admin) List students registered on an index
    ListIndex {
        #[arg(short, long)]
        index: String,
    },
    /// (admin) List students registered on any index of a course
    ListCourse {
        #[arg(long)]
        code: String,
    },
    /// (admin) Register a new student account
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        matric: String,
        /// M, F or O
        #[arg(long)]
        gender: String,
        #[arg(long)]
        nationality: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Initial password for the new account
        #[arg(long)]
        new_password: String,
    },
    /// Print a stored password hash, for seeding admins.txt
    HashPassword {
        #[arg(value_name = "PASSWORD")]
        plain: String,
    },
    /// (admin) Show or change the student access period
    AccessPeriod {
        /// New start, e.g. 2020-11-01T09:00
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// New end, e.g. 2020-11-14T23:59
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
