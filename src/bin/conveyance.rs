//! Conveyance demo
//!
//! Runs the six-phase contract exchange end to end and prints the protocol
//! summary as JSON.
//!
//! Usage:
//!   conveyance [--config conveyance.toml] [--subsequent] [--price 500000] [--contract-id C-1]

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use conveyance::contract::{PartyDetails, PropertyDetails};
use conveyance::{ContractDetails, ProtocolConfig, ProtocolOrchestrator, Role};
use tracing_subscriber::EnvFilter;

/// Secure property contract exchange through a relaying hub
#[derive(Parser)]
#[command(name = "conveyance")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat hub and seller as having communicated before
    #[arg(long)]
    subsequent: bool,

    /// Purchase price in pounds
    #[arg(long, default_value = "500000")]
    price: String,

    /// Contract reference (random UUID when omitted)
    #[arg(long, default_value = "")]
    contract_id: String,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` directives plus info-level logging for this crate
fn log_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match "conveyance=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => ProtocolConfig::load(path)?,
        None => ProtocolConfig::default(),
    };
    let orchestrator = ProtocolOrchestrator::with_config(config);

    println!("=== Phase 1: Party initialization ===");
    let init = orchestrator.initialize_parties()?;
    for party in &init.parties {
        let fingerprint = orchestrator.keys().get_public(&party.party)?.fingerprint();
        println!("  {} registered, key {}", party.party, fingerprint);
    }

    println!("=== Phase 2: Secure channels ===");
    let channels = orchestrator.establish_channels(!cli.subsequent)?;
    for channel in &channels.channels {
        println!(
            "  {} ({:?}), wrapped key {}",
            channel.session_id, channel.channel_type, channel.wrapped_key_fingerprint
        );
    }

    println!("=== Phase 3: Seller sends contract ===");
    let sent = orchestrator.initiate_contract_exchange(demo_details(&orchestrator, &cli))?;
    println!("  contract {} sealed for {}", sent.contract_id, sent.recipient);

    println!("=== Phase 4: Hub forwards contract ===");
    let forwarded = orchestrator.hub_receive_and_forward(&sent.envelope)?;
    println!("  verified and resealed for {}", forwarded.recipient);

    println!("=== Phase 5: Buyer signs ===");
    let signed = orchestrator.buyer_sign_contract(&forwarded.envelope)?;
    println!(
        "  signed by {} as {} at {}",
        signed.signature_details.signer.name,
        signed.signature_details.signer.role,
        signed.signature_details.timestamp
    );

    println!("=== Phase 6: Hub delivers signed contract ===");
    let delivered = orchestrator.hub_forward_signed(&signed.envelope)?;
    println!(
        "  signature valid: {}, legally valid: {}",
        delivered.verification.is_valid, delivered.verification.legal_validity
    );

    println!();
    println!("{}", serde_json::to_string_pretty(&orchestrator.summary())?);
    Ok(())
}

fn demo_details(orchestrator: &ProtocolOrchestrator, cli: &Cli) -> ContractDetails {
    let config = orchestrator.config();
    ContractDetails {
        seller: PartyDetails {
            name: "Property Seller".to_string(),
            address: "10 Market Street, London".to_string(),
            solicitor: orchestrator.party_id(Role::SellerSolicitor).to_string(),
        },
        buyer: PartyDetails {
            name: config.buyer_name.clone(),
            address: "22 Station Road, Manchester".to_string(),
            solicitor: orchestrator.party_id(Role::Hub).to_string(),
        },
        property: PropertyDetails {
            address: "1 Orchard Lane, Oxford".to_string(),
            description: "Three-bedroom detached house".to_string(),
            price: cli.price.clone(),
            completion_date: "2026-12-31".to_string(),
            contract_id: cli.contract_id.clone(),
        },
    }
}
