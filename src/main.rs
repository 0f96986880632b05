use std::io::Write as _;

use anyhow::Context;
use structopt::StructOpt;

use emv_kernel::context::Context as KernelContext;
use emv_kernel::crypto::FileCertificateManager;
use emv_kernel::model::{ApplicationHint, Terminal, Transaction};
use emv_kernel::pin_asker::PinAsker;

#[derive(Debug, StructOpt)]
struct Options {
    #[structopt(short, long, default_value = "0", help = "Reader index, see list-readers")]
    reader: usize,
    #[structopt(long, help = "Use the contactless (PPSE) directory instead of the contact PSE")]
    contactless: bool,
    #[structopt(
        long,
        default_value = "./keys",
        help = "Directory of <rid-hex>/<index>.pem scheme public keys"
    )]
    keys: String,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "List connected readers")]
    ListReaders,
    #[structopt(about = "Discover and show candidate applications")]
    ShowPse,
    #[structopt(about = "Run a full offline transaction")]
    RunTransaction {
        #[structopt(long, help = "Amount authorized, in minor currency units")]
        amount: u64,
        #[structopt(long, default_value = "0")]
        amount_other: u64,
        #[structopt(long, help = "AID to select, hex-encoded; omit to use directory discovery")]
        aid: Option<String>,
    },
    #[structopt(about = "Decode a hex-encoded DOL and print its entries")]
    DumpDol { dol_hex: String },
}

/// Reads a PIN from stdin.
struct TerminalPinAsker;

impl PinAsker for TerminalPinAsker {
    fn retrieve_pin(&mut self) -> anyhow::Result<String> {
        print!("Enter PIN: ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let options = Options::from_args();
    let pcsc_context = pcsc::Context::establish(pcsc::Scope::User).context("failed to create PCSC session")?;

    match &options.cmd {
        Command::ListReaders => list_readers(&pcsc_context),
        Command::ShowPse => show_pse(&options, &pcsc_context),
        Command::RunTransaction { amount, amount_other, aid } => {
            run_transaction(&options, &pcsc_context, *amount, *amount_other, aid.as_deref())
        }
        Command::DumpDol { dol_hex } => dump_dol(dol_hex),
    }
}

fn list_readers(context: &pcsc::Context) -> anyhow::Result<()> {
    let readers = context.list_readers_owned().context("failed to find readers")?;
    for (idx, reader) in readers.iter().enumerate() {
        println!("{idx}: {reader:?}");
    }
    Ok(())
}

fn get_card(options: &Options, context: &pcsc::Context) -> anyhow::Result<pcsc::Card> {
    let readers = context.list_readers_owned().context("failed to list readers")?;
    if options.reader >= readers.len() {
        anyhow::bail!("no reader at index {}, only {} readers found", options.reader, readers.len());
    }
    Ok(context.connect(&readers[options.reader], pcsc::ShareMode::Exclusive, pcsc::Protocols::ANY)?)
}

fn show_pse(options: &Options, pcsc_context: &pcsc::Context) -> anyhow::Result<()> {
    let card = get_card(options, pcsc_context).context("failed to connect to card")?;
    let cert_manager = FileCertificateManager::new(&options.keys);
    let mut kernel = KernelContext::new(card, cert_manager, Terminal::default());

    let infos = kernel
        .list_applications(options.contactless, &[])
        .context("failed to discover applications")?;
    for info in &infos {
        println!(
            "{} — {} (priority {:?})",
            hex::encode(&info.name),
            info.label,
            info.priority
        );
    }
    Ok(())
}

fn run_transaction(
    options: &Options,
    pcsc_context: &pcsc::Context,
    amount: u64,
    amount_other: u64,
    aid: Option<&str>,
) -> anyhow::Result<()> {
    let card = get_card(options, pcsc_context).context("failed to connect to card")?;
    let cert_manager = FileCertificateManager::new(&options.keys);
    let mut kernel = KernelContext::new(card, cert_manager, Terminal::default());

    let aid = match aid {
        Some(aid) => hex::decode(aid).context("AID must be hex-encoded")?,
        None => {
            let infos = kernel
                .list_applications(options.contactless, &[ApplicationHint { name: Vec::new(), partial: true }])
                .context("failed to discover applications")?;
            infos.first().map(|i| i.name.clone()).context("no applications found on card")?
        }
    };

    kernel.select_application(&aid).context("failed to select application")?;
    kernel.authenticate().context("offline data authentication failed")?;

    let mut pin_asker = TerminalPinAsker;
    kernel.verify_cardholder(&mut pin_asker).context("cardholder verification failed")?;

    let tx = Transaction {
        amount_authorized: amount,
        amount_other,
        date: today_bcd(),
        transaction_type: 0x00,
    };
    let result = kernel.generate_cryptogram(&tx).context("cryptogram generation failed")?;

    println!("cryptogram type: {:?}", result.cryptogram_type);
    println!("cryptogram: {}", hex::encode(&result.cryptogram));
    println!("should go online: {}", result.should_go_online);
    println!("TVR: {}", hex::encode(kernel.tvr().to_bytes()));

    Ok(())
}

/// Placeholder transaction date until the host supplies one; zero-filled
/// rather than reading the system clock so runs stay reproducible.
fn today_bcd() -> [u8; 3] {
    [0x00, 0x00, 0x00]
}

fn dump_dol(hex_str: &str) -> anyhow::Result<()> {
    let raw = hex::decode(hex_str).context("DOL must be hex-encoded")?;
    let dol = emv_kernel::tlv::Dol::try_from(raw.as_slice()).context("failed to parse DOL")?;
    for entry in &dol.entries {
        println!("tag 0x{:04x}: {} byte(s)", entry.tag, entry.length);
    }
    println!("total payload size: {} byte(s)", dol.size());
    Ok(())
}

