//! Sealdrop relay command line.
//!
//! Runs one relay operation against a redb database and prints the result as
//! JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! sealdrop register --handle neo --public-key "$(cat neo.pub)" --private-key-backup neo.json
//! sealdrop upload --sender neo --recipient trinity --encrypted-key EK --iv IV \
//!     --file-name notes.txt --file-data-path notes.txt.enc
//! sealdrop inbox trinity
//! sealdrop download 0f8fad5b-d9cb-469f-a165-70867728950e
//! ```

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use sealdrop_core::{EnvelopeBody, PrivateKeyBackup};
use sealdrop_server::{RedbStorage, Relay, RelayConfig, SystemEnv};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealdrop relay
#[derive(Parser, Debug)]
#[command(name = "sealdrop")]
#[command(about = "Zero-knowledge relay for end-to-end encrypted file sharing")]
#[command(version)]
struct Args {
    /// Path to the relay database
    #[arg(long, env = "SEALDROP_DB", default_value = "sealdrop.redb", global = true)]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEALDROP_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Reject uploads to handles without a registered public key
    #[arg(long, global = true)]
    require_known_recipient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a handle with its public key
    Register {
        /// Handle to register
        #[arg(long)]
        handle: String,

        /// Public key, stored verbatim
        #[arg(long)]
        public_key: String,

        /// JSON file holding the password-wrapped private key
        #[arg(long)]
        private_key_backup: Option<PathBuf>,
    },

    /// Print the public key of a handle
    Key {
        /// Registered handle
        handle: String,
    },

    /// Print the private key backup of a handle
    Backup {
        /// Registered handle
        handle: String,
    },

    /// List every registered handle with its public key
    Users,

    /// Store an encrypted file for a recipient
    Upload(UploadArgs),

    /// List envelopes sent to a handle
    Inbox {
        /// Recipient handle
        handle: String,
    },

    /// Print a stored envelope
    Download {
        /// Envelope id
        id: String,
    },
}

#[derive(ClapArgs, Debug)]
struct UploadArgs {
    /// Sender handle
    #[arg(long)]
    sender: String,

    /// Recipient handle
    #[arg(long)]
    recipient: String,

    /// File key encrypted to the recipient
    #[arg(long)]
    encrypted_key: String,

    /// Initialization vector of the file cipher
    #[arg(long)]
    iv: String,

    /// Original file name
    #[arg(long)]
    file_name: String,

    /// File ciphertext
    #[arg(long, required_unless_present = "file_data_path", conflicts_with = "file_data_path")]
    file_data: Option<String>,

    /// Read the file ciphertext from this path
    #[arg(long)]
    file_data_path: Option<PathBuf>,

    /// MIME type of the original file
    #[arg(long)]
    file_type: Option<String>,
}

impl UploadArgs {
    fn into_body(self) -> io::Result<EnvelopeBody> {
        let file_data = match (self.file_data, self.file_data_path) {
            (Some(data), _) => data,
            (None, Some(path)) => fs::read_to_string(path)?,
            (None, None) => String::new(),
        };

        let mut body: EnvelopeBody = [
            (EnvelopeBody::SENDER, self.sender),
            (EnvelopeBody::RECIPIENT, self.recipient),
            (EnvelopeBody::ENCRYPTED_KEY, self.encrypted_key),
            (EnvelopeBody::IV, self.iv),
            (EnvelopeBody::FILE_DATA, file_data),
            (EnvelopeBody::FILE_NAME, self.file_name),
        ]
        .into_iter()
        .collect();
        if let Some(file_type) = self.file_type {
            body.insert("fileType", file_type);
        }

        Ok(body)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let storage = open_storage(&args.db)?;
    let config = RelayConfig { require_known_recipient: args.require_known_recipient };
    let relay = Relay::new(SystemEnv::new(), storage, config);

    tracing::debug!("Using database {}", args.db.display());

    match args.command {
        Command::Register { handle, public_key, private_key_backup } => {
            let backup = private_key_backup.as_deref().map(read_backup).transpose()?;
            relay.register(&handle, &public_key, backup.as_ref())?;
            emit(&json!({ "message": "registered", "handle": handle }))
        },
        Command::Key { handle } => {
            let public_key = relay.get_public_key(&handle)?;
            emit(&json!({ "publicKey": public_key }))
        },
        Command::Backup { handle } => {
            let backup = relay.get_encrypted_private_key(&handle)?;
            emit(&json!({ "encryptedPrivateKey": backup }))
        },
        Command::Users => emit(&relay.list_keys()?),
        Command::Upload(upload) => {
            let id = relay.upload_envelope(&upload.into_body()?)?;
            emit(&json!({ "message": "uploaded", "id": id }))
        },
        Command::Inbox { handle } => emit(&relay.list_inbox(&handle)?),
        Command::Download { id } => emit(&relay.download(&id)?),
    }
}

/// Open the database, creating its parent directory if needed.
fn open_storage(path: &Path) -> Result<RedbStorage, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    Ok(RedbStorage::open(path)?)
}

fn read_backup(path: &Path) -> Result<PrivateKeyBackup, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(PrivateKeyBackup::new(serde_json::from_str(&text)?))
}

/// Write `value` to stdout as pretty JSON.
fn emit(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
