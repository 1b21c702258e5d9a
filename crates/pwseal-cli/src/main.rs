//! pwseal: password-based file encryption CLI
//!
//! Commands:
//!   encrypt <input>   - seal a file into a `.enc` container
//!   decrypt <input>   - recover the original file from a container
//!   inspect <input>   - show container header and framing (no password)
//!   config show       - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use pwseal_core::{LogFormat, PwsealConfig};
use pwseal_crypto::{ContainerError, ProgressFn};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pwseal",
    version,
    about = "Password-based chunked file encryption",
    long_about = "pwseal: encrypt and decrypt files into authenticated AES-256-GCM containers"
)]
struct Cli {
    /// Path to config.toml
    #[arg(
        long,
        short = 'c',
        env = "PWSEAL_CONFIG",
        default_value = "~/.config/pwseal/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "PWSEAL_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides config
    #[arg(long, env = "PWSEAL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file into a password-protected container
    ///
    /// The password is read from PWSEAL_PASSWORD, or prompted for twice.
    Encrypt {
        /// File to encrypt
        input: PathBuf,
        /// Output container path (default: <input>.enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// PBKDF2 iterations (overrides config)
        #[arg(long)]
        iterations: Option<u32>,
        /// Plaintext bytes per chunk (overrides config)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Overwrite the output if it exists
        #[arg(long)]
        force: bool,
    },

    /// Decrypt a container back into the original file
    ///
    /// The password is read from PWSEAL_PASSWORD, or prompted for.
    Decrypt {
        /// Container to decrypt
        input: PathBuf,
        /// Output path (default: stored file name, next to the container)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Overwrite the output if it exists
        #[arg(long)]
        force: bool,
    },

    /// Show a container's header and frame layout
    Inspect {
        /// Container to inspect
        input: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = PwsealConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.unwrap_or(config.log.format);
    init_logging(&level, format);

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            iterations,
            chunk_size,
            force,
        } => cmd_encrypt(&config, &input, output.as_deref(), iterations, chunk_size, force),
        Commands::Decrypt {
            input,
            output,
            force,
        } => cmd_decrypt(&input, output.as_deref(), force),
        Commands::Inspect { input } => cmd_inspect(&input),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

// ── Password input ────────────────────────────────────────────────────────────

fn read_password(confirm: bool) -> Result<SecretString> {
    if let Ok(pw) = std::env::var("PWSEAL_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    let pw = rpassword::prompt_password("Password: ").context("reading password")?;
    if confirm {
        let again = rpassword::prompt_password("Confirm password: ").context("reading password")?;
        if pw != again {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(SecretString::from(pw))
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

const PROGRESS_SCALE: u64 = 1000;

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(PROGRESS_SCALE);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_sink(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |fraction| pb.set_position((fraction * PROGRESS_SCALE as f64) as u64))
}

// ── Atomic output ─────────────────────────────────────────────────────────────

/// Stage output in a temp file beside `dest`, persisting only if `write` succeeds.
fn write_atomically<F>(dest: &Path, force: bool, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    if dest.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", dest.display());
    }
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer)?;
        writer.flush().context("flushing output")?;
    }
    tmp.as_file().sync_all().context("syncing output")?;

    if force {
        tmp.persist(dest)
    } else {
        tmp.persist_noclobber(dest)
    }
    .map_err(|e| e.error)
    .with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}

// ── `pwseal encrypt` ──────────────────────────────────────────────────────────

fn cmd_encrypt(
    config: &PwsealConfig,
    input: &Path,
    output: Option<&Path>,
    iterations: Option<u32>,
    chunk_size: Option<usize>,
    force: bool,
) -> Result<()> {
    let mut options = config.crypto.to_options();
    if let Some(n) = iterations {
        options.iterations = n;
    }
    if let Some(n) = chunk_size {
        options.chunk_size = n;
    }
    options.validate().context("invalid encryption options")?;

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let file_size = file
        .metadata()
        .with_context(|| format!("reading metadata: {}", input.display()))?
        .len();
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("{} has no file name", input.display()))?;

    let dest = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let mut name = input.as_os_str().to_os_string();
        name.push(".enc");
        PathBuf::from(name)
    });

    let password = read_password(true)?;

    println!("Encrypting {} → {}", input.display(), dest.display());
    let pb = make_progress_bar("encrypt");
    pb.set_message("deriving key...".to_string());
    let progress = progress_sink(&pb);

    let mut written = 0u64;
    write_atomically(&dest, force, |writer| {
        let mut reader = BufReader::new(file);
        written = pwseal_crypto::encrypt_to_writer(
            &mut reader,
            file_size,
            &file_name,
            &password,
            Some(&progress),
            &options,
            writer,
        )
        .with_context(|| format!("encrypting {}", input.display()))?;
        Ok(())
    })
    .inspect_err(|_| pb.abandon_with_message("failed".to_string()))?;

    pb.finish_with_message("done".to_string());
    info!(input = %input.display(), output = %dest.display(), bytes = written, "encrypted");
    println!("  size:       {}", fmt_bytes(file_size));
    println!("  container:  {}", fmt_bytes(written));
    println!("  chunk size: {}", fmt_bytes(options.chunk_size as u64));
    println!("  iterations: {}", options.iterations);

    Ok(())
}

// ── `pwseal decrypt` ──────────────────────────────────────────────────────────

fn cmd_decrypt(input: &Path, output: Option<&Path>, force: bool) -> Result<()> {
    let container = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let password = read_password(false)?;

    println!("Decrypting {}", input.display());
    let pb = make_progress_bar("decrypt");
    pb.set_message("deriving key...".to_string());
    let progress = progress_sink(&pb);

    let decrypted = match pwseal_crypto::decrypt(&container, &password, Some(&progress)) {
        Ok(d) => d,
        Err(ContainerError::WrongPasswordOrCorruptData) => {
            pb.abandon_with_message("failed".to_string());
            anyhow::bail!("incorrect password or corrupted file: {}", input.display());
        }
        Err(e) => {
            pb.abandon_with_message("failed".to_string());
            return Err(e).with_context(|| format!("decrypting {}", input.display()));
        }
    };
    pb.finish_with_message("done".to_string());

    let dest = match output {
        Some(p) => p.to_path_buf(),
        None => default_decrypt_path(input, &decrypted.file_name),
    };
    write_atomically(&dest, force, |writer| {
        writer
            .write_all(&decrypted.data)
            .with_context(|| format!("writing {}", dest.display()))
    })?;

    info!(input = %input.display(), output = %dest.display(), bytes = decrypted.data.len(), "decrypted");
    println!("  file:  {}", dest.display());
    println!("  bytes: {}", fmt_bytes(decrypted.data.len() as u64));

    Ok(())
}

/// Place the stored file name next to the container, discarding any path
/// components the header may carry.
fn default_decrypt_path(input: &Path, stored_name: &str) -> PathBuf {
    let dir = input.parent().unwrap_or(Path::new(""));
    let name = Path::new(stored_name)
        .file_name()
        .map(|n| n.to_os_string())
        .or_else(|| {
            input
                .file_stem()
                .filter(|_| input.extension().is_some_and(|e| e == "enc"))
                .map(|s| s.to_os_string())
        })
        .unwrap_or_else(|| "decrypted.bin".into());
    dir.join(name)
}

// ── `pwseal inspect` ──────────────────────────────────────────────────────────

fn cmd_inspect(input: &Path) -> Result<()> {
    let container = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let info = pwseal_crypto::inspect(&container)
        .with_context(|| format!("inspecting {}", input.display()))?;
    let header = &info.header;

    println!("{}", input.display());
    println!("  version:     {}", header.v);
    println!("  algorithm:   {}", header.algo);
    println!("  file name:   {}", header.file_name);
    println!("  file size:   {}", fmt_bytes(header.file_size));
    println!("  chunk size:  {}", fmt_bytes(header.chunk_size));
    println!("  iterations:  {}", header.iterations);
    println!("  salt:        {}", header.salt_b64);
    println!("  header:      {} bytes", info.header_len);
    println!(
        "  frames:      {} (expected {})",
        info.frames,
        header.expected_chunks()
    );
    println!("  ciphertext:  {}", fmt_bytes(info.ciphertext_bytes));

    Ok(())
}

// ── `pwseal config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &PwsealConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decrypt_path_strips_components() {
        let input = Path::new("/data/box/report.pdf.enc");
        assert_eq!(
            default_decrypt_path(input, "../../etc/passwd"),
            PathBuf::from("/data/box/passwd")
        );
        assert_eq!(
            default_decrypt_path(input, "report.pdf"),
            PathBuf::from("/data/box/report.pdf")
        );
    }

    #[test]
    fn test_default_decrypt_path_fallbacks() {
        assert_eq!(
            default_decrypt_path(Path::new("dir/photo.jpg.enc"), ".."),
            PathBuf::from("dir/photo.jpg")
        );
        assert_eq!(
            default_decrypt_path(Path::new("dir/blob"), ""),
            PathBuf::from("dir/decrypted.bin")
        );
    }

    #[test]
    fn test_expand_tilde() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(
            expand_tilde(Path::new("~/.config/pwseal/config.toml")),
            PathBuf::from("/home/tester/.config/pwseal/config.toml")
        );
        assert_eq!(expand_tilde(Path::new("/etc/x")), PathBuf::from("/etc/x"));
    }

    #[test]
    fn test_fmt_bytes() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_write_atomically_no_clobber() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("out.bin");
        std::fs::write(&dest, b"original").unwrap();

        let result = write_atomically(&dest, false, |w| Ok(w.write_all(b"new")?));
        assert!(result.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"original");

        write_atomically(&dest, true, |w| Ok(w.write_all(b"new")?)).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_write_atomically_failure_leaves_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("out.bin");

        let result = write_atomically(&dest, false, |w| {
            w.write_all(b"partial")?;
            anyhow::bail!("boom")
        });
        assert!(result.is_err());
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_roundtrip_through_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("plain.txt");
        std::fs::write(&src, b"round trip through the filesystem").unwrap();
        let password = SecretString::from("pw");
        let options = pwseal_crypto::EncryptOptions {
            iterations: 1000,
            chunk_size: 8,
            salt_len: 16,
        };

        let dest = tmp.path().join("plain.txt.enc");
        write_atomically(&dest, false, |w| {
            let mut reader = BufReader::new(File::open(&src)?);
            pwseal_crypto::encrypt_to_writer(&mut reader, 33, "plain.txt", &password, None, &options, w)?;
            Ok(())
        })
        .unwrap();

        let container = std::fs::read(&dest).unwrap();
        let out = pwseal_crypto::decrypt(&container, &password, None).unwrap();
        assert_eq!(out.file_name, "plain.txt");
        assert_eq!(out.data, b"round trip through the filesystem");
        assert_eq!(
            default_decrypt_path(&dest, &out.file_name),
            tmp.path().join("plain.txt")
        );
    }
}
