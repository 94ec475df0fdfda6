#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use forceadmin_core::address::Address;
use forceadmin_core::config::{ModuleConfig, Params};
use forceadmin_core::errors::{Denial, ForceAdminError};
use forceadmin_core::msg::ForceChangeAdminMsg;
use forceadmin_core::state::OverrideState;
use forceadmin_core::traits::AuthorityProvider;
use forceadmin_engine::audit::sink::JsonlAuditSink;
use forceadmin_engine::executor::FixedHeight;
use forceadmin_engine::genesis::{init_contracts, register_contract, ContractEntry};
use forceadmin_engine::guard::GuardDecision;
use forceadmin_engine::keeper::Keeper;
use forceadmin_engine::store::file::FileStore;
use forceadmin_sign::SignedRequest;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "forceadmin",
    version,
    about = "One-time governance override of a contract's admin."
)]
struct Cli {
    /// Log filter (e.g. "info", "forceadmin_engine=debug").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create a module config and its state file.
    Init {
        /// Path to the module config (.json).
        file: String,

        /// Governance authority address.
        #[arg(long)]
        authority: String,

        /// Bech32 prefix for accepted addresses.
        #[arg(long, default_value = "terra")]
        prefix: String,

        /// JSON array of {contract, admin} entries to register.
        #[arg(long)]
        contracts: Option<String>,

        /// 32-byte ed25519 public key of the authority. Once set, `submit`
        /// only accepts requests signed by it.
        #[arg(long)]
        pubkey: Option<String>,
    },

    /// Register a contract with its current admin.
    Register {
        /// Path to the module config (.json).
        file: String,

        #[arg(long)]
        contract: String,

        #[arg(long)]
        admin: String,
    },

    /// Dry-run the guard against a request. Nothing is written.
    Check {
        /// Path to the module config (.json).
        file: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Sign a request file in place.
    Sign {
        /// Path to the request (.json).
        request: String,

        /// Path to a 32-byte ed25519 secret key.
        #[arg(long)]
        key: String,

        /// Identifier recorded in the signature block.
        #[arg(long)]
        key_id: String,

        /// Bech32 prefix the request's addresses must carry.
        #[arg(long, default_value = "terra")]
        prefix: String,
    },

    /// Execute the override.
    Submit {
        /// Path to the module config (.json).
        file: String,

        #[command(flatten)]
        request: RequestArgs,

        /// Block height recorded in the usage flag and event.
        #[arg(long)]
        height: i64,

        /// Expected governance public key file; must match the configured one.
        #[arg(long)]
        pubkey: Option<String>,
    },

    /// Show whether the override has been used.
    Status {
        /// Path to the module config (.json).
        file: String,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a contract's current admin.
    Admin {
        /// Path to the module config (.json).
        file: String,

        #[arg(long)]
        contract: String,
    },

    /// Verify or checkpoint the audit log.
    Audit {
        /// Path to the module config (.json).
        file: String,

        /// Verify the hash chain.
        #[arg(long)]
        verify: bool,

        /// Write a checkpoint of the chain head to this path.
        #[arg(long)]
        checkpoint: Option<String>,

        /// Check the log still matches a checkpoint.
        #[arg(long)]
        verify_checkpoint: Option<String>,
    },
}

/// A request given either as a file or as three flags.
#[derive(Args)]
struct RequestArgs {
    /// Path to a request (.json), signed or not.
    #[arg(long, conflicts_with_all = ["authority", "contract", "new_admin"])]
    request: Option<String>,

    #[arg(long)]
    authority: Option<String>,

    #[arg(long)]
    contract: Option<String>,

    #[arg(long)]
    new_admin: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.cmd {
        Cmd::Init {
            file,
            authority,
            prefix,
            contracts,
            pubkey,
        } => cmd_init(
            &file,
            &authority,
            &prefix,
            contracts.as_deref(),
            pubkey.as_deref(),
        ),

        Cmd::Register {
            file,
            contract,
            admin,
        } => cmd_register(&file, &contract, &admin),

        Cmd::Check { file, request } => cmd_check(&file, &request),

        Cmd::Sign {
            request,
            key,
            key_id,
            prefix,
        } => cmd_sign(&request, &key, &key_id, &prefix),

        Cmd::Submit {
            file,
            request,
            height,
            pubkey,
        } => cmd_submit(&file, &request, height, pubkey.as_deref()),

        Cmd::Status { file, json } => cmd_status(&file, json),

        Cmd::Admin { file, contract } => cmd_admin(&file, &contract),

        Cmd::Audit {
            file,
            verify,
            checkpoint,
            verify_checkpoint,
        } => cmd_audit(
            &file,
            verify,
            checkpoint.as_deref(),
            verify_checkpoint.as_deref(),
        ),
    }
}

fn state_path(file: &str) -> PathBuf {
    Path::new(file).with_extension("state.json")
}

fn audit_path(file: &str) -> PathBuf {
    Path::new(file).with_extension("audit.jsonl")
}

fn load_params(file: &str) -> Result<Params> {
    let config = ModuleConfig::load(file)?;
    config
        .validate()
        .with_context(|| format!("{file}: invalid module config"))
}

fn open_keeper(file: &str) -> Result<Keeper<FileStore>> {
    let params = load_params(file)?;
    open_keeper_with(file, params)
}

fn open_keeper_with(file: &str, params: Params) -> Result<Keeper<FileStore>> {
    let state = state_path(file);
    tracing::debug!(config = file, state = %state.display(), "opening module state");
    let store = FileStore::open(&state)?;
    Ok(Keeper::new(store, params))
}

fn read_request(args: &RequestArgs) -> Result<SignedRequest> {
    if let Some(path) = &args.request {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
        return serde_json::from_str(&content).with_context(|| format!("{path}: invalid request"));
    }
    match (&args.authority, &args.contract, &args.new_admin) {
        (Some(authority), Some(contract), Some(new_admin)) => Ok(SignedRequest::unsigned(
            ForceChangeAdminMsg::new(authority, contract, new_admin),
        )),
        _ => bail!("specify --request, or all of --authority, --contract and --new-admin"),
    }
}

fn read_key_bytes(path: &str, what: &str) -> Result<[u8; 32]> {
    let bytes = std::fs::read(path).map_err(|e| anyhow!("cannot read {what} {path}: {e}"))?;
    let head = bytes
        .get(..32)
        .ok_or_else(|| anyhow!("{what} must be at least 32 bytes"))?;
    <[u8; 32]>::try_from(head).map_err(|e| anyhow!("{what}: {e}"))
}

/// Enforce the configured governance key, if any.
///
/// With a key configured the request must carry its valid signature and
/// name the configured authority as signer.
fn authenticate(req: &SignedRequest, params: &Params, pubkey: Option<&str>) -> Result<()> {
    let key_bytes = match (params.governance_pubkey(), pubkey) {
        (Some(configured), Some(path)) => {
            if read_key_bytes(path, "pubkey")? != *configured {
                bail!("{path} is not the configured governance key");
            }
            *configured
        }
        (Some(configured), None) => *configured,
        (None, Some(_)) => bail!("no governance_pubkey configured; re-run init with --pubkey"),
        (None, None) => return Ok(()),
    };

    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| anyhow!("invalid governance pubkey: {e}"))?;
    if !forceadmin_sign::verify::verify_request(req, &verifying_key)? {
        bail!("signature verification failed");
    }
    let governance = params.governance_authority();
    for signer in req.msg.signers(params.bech32_prefix())? {
        if &signer != governance {
            bail!("request signer {signer} is not the governance authority {governance}");
        }
    }
    Ok(())
}

fn denial_json(denial: Denial) -> serde_json::Value {
    serde_json::json!({
        "denied": true,
        "code": denial.code(),
        "message": denial.to_string(),
        "retryable": denial.is_retryable(),
    })
}

fn cmd_init(
    file: &str,
    authority: &str,
    prefix: &str,
    contracts: Option<&str>,
    pubkey: Option<&str>,
) -> Result<()> {
    let state = state_path(file);
    for existing in [Path::new(file), state.as_path()] {
        if existing.exists() {
            bail!("{} already exists", existing.display());
        }
    }
    let mut config = ModuleConfig::new(authority, prefix);
    if let Some(path) = pubkey {
        let key = read_key_bytes(path, "pubkey")?;
        ed25519_dalek::VerifyingKey::from_bytes(&key)
            .map_err(|e| anyhow!("invalid pubkey {path}: {e}"))?;
        config = config.with_pubkey(&key);
    }
    let params = config.validate()?;

    let entries: Vec<ContractEntry> = match contracts {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
            serde_json::from_str(&content).with_context(|| format!("{path}: invalid contracts"))?
        }
        None => Vec::new(),
    };
    for entry in &entries {
        for addr in [&entry.contract, &entry.admin] {
            if addr.prefix() != params.bech32_prefix() {
                bail!("{addr}: expected prefix {}", params.bech32_prefix());
            }
        }
    }

    config.save(file)?;
    let mut store = FileStore::open(&state)?;
    if entries.is_empty() {
        store.flush()?;
    } else {
        init_contracts(&mut store, &entries)?;
    }
    eprintln!("  created {file} ({} contracts)", entries.len());
    Ok(())
}

fn cmd_register(file: &str, contract: &str, admin: &str) -> Result<()> {
    let mut keeper = open_keeper(file)?;
    let prefix = keeper.params().bech32_prefix().to_string();
    let contract = Address::parse_with_prefix(contract, &prefix)
        .map_err(|e| anyhow!("invalid contract address: {e}"))?;
    let admin = Address::parse_with_prefix(admin, &prefix)
        .map_err(|e| anyhow!("invalid admin address: {e}"))?;
    register_contract(keeper.store_mut(), &contract, &admin)?;
    eprintln!("  registered {contract} (admin: {admin})");
    Ok(())
}

fn cmd_check(file: &str, args: &RequestArgs) -> Result<()> {
    let req = read_request(args)?;
    let keeper = open_keeper(file)?;
    if let Err(e) = req.msg.validate_basic(keeper.params().bech32_prefix()) {
        drop(keeper);
        let out = serde_json::json!({ "valid": false, "error": e.to_string() });
        println!("{}", serde_json::to_string_pretty(&out)?);
        std::process::exit(1);
    }
    let decision = keeper.authorize(&req.msg);
    // Release the store lock before any early exit.
    drop(keeper);
    match decision {
        GuardDecision::Approved(approval) => {
            let out = serde_json::json!({
                "valid": true,
                "allowed": true,
                "contract": approval.contract(),
                "new_admin": approval.new_admin(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        GuardDecision::Denied(denial) => {
            let mut out = denial_json(denial);
            out["valid"] = serde_json::Value::Bool(true);
            println!("{}", serde_json::to_string_pretty(&out)?);
            std::process::exit(1);
        }
    }
}

fn cmd_sign(request: &str, key_path: &str, key_id: &str, prefix: &str) -> Result<()> {
    let content =
        std::fs::read_to_string(request).with_context(|| format!("cannot read {request}"))?;
    let req: SignedRequest =
        serde_json::from_str(&content).with_context(|| format!("{request}: invalid request"))?;
    req.msg
        .validate_basic(prefix)
        .with_context(|| format!("{request}: refusing to sign"))?;

    let signing_key = ed25519_dalek::SigningKey::from_bytes(&read_key_bytes(key_path, "key")?);
    let signed = forceadmin_sign::sign::sign_request(&req.msg, &signing_key, key_id);

    std::fs::write(request, serde_json::to_string_pretty(&signed)?)?;
    eprintln!("  signed {request} (key_id: {key_id})");
    Ok(())
}

fn cmd_submit(file: &str, args: &RequestArgs, height: i64, pubkey: Option<&str>) -> Result<()> {
    let req = read_request(args)?;
    let params = load_params(file)?;
    authenticate(&req, &params, pubkey)?;

    let mut keeper = open_keeper_with(file, params)?;
    let mut sink = JsonlAuditSink::new(audit_path(file));
    let outcome = keeper.handle_force_change_admin(&FixedHeight(height), &mut sink, &req.msg);
    drop(keeper);
    match outcome {
        Ok(event) => {
            println!("{}", serde_json::to_string_pretty(&event)?);
            eprintln!("  admin of {} is now {}", event.contract, event.new_admin);
            Ok(())
        }
        Err(ForceAdminError::Denied(denial)) => {
            println!("{}", serde_json::to_string_pretty(&denial_json(denial))?);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_status(file: &str, json_out: bool) -> Result<()> {
    let keeper = open_keeper(file)?;
    let state = keeper.override_state();

    if json_out {
        let out = serde_json::json!({
            "governance_authority": keeper.params().governance_authority(),
            "bech32_prefix": keeper.params().bech32_prefix(),
            "override": state,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Authority: {}", keeper.params().governance_authority());
    match state {
        OverrideState::Unused => println!("Override:  available"),
        OverrideState::Used { height: Some(h) } => {
            println!("Override:  used at height {h}")
        }
        OverrideState::Used { height: None } => {
            println!("Override:  used")
        }
    }
    Ok(())
}

fn cmd_admin(file: &str, contract: &str) -> Result<()> {
    let keeper = open_keeper(file)?;
    let contract = Address::parse_with_prefix(contract, keeper.params().bech32_prefix())
        .map_err(|e| anyhow!("invalid contract address: {e}"))?;
    let out = serde_json::json!({
        "contract": contract,
        "admin": keeper.admin_of(&contract),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_audit(
    file: &str,
    verify: bool,
    checkpoint: Option<&str>,
    verify_checkpoint: Option<&str>,
) -> Result<()> {
    if !verify && checkpoint.is_none() && verify_checkpoint.is_none() {
        bail!("specify --verify, --checkpoint or --verify-checkpoint");
    }
    let path = audit_path(file);
    if !path.exists() {
        eprintln!("  no audit log found at {}", path.display());
        return Ok(());
    }
    let log = forceadmin_engine::audit::log::AuditLog::new(&path);

    if verify {
        let count = log.verify()?;
        eprintln!("  audit chain valid ({count} entries)");
    }
    if let Some(cp) = checkpoint {
        let written = log.checkpoint(Path::new(cp))?;
        eprintln!("  checkpoint written to {cp} ({} entries)", written.entries);
    }
    if let Some(cp) = verify_checkpoint {
        if !log.verify_checkpoint(Path::new(cp))? {
            bail!("audit log does not match checkpoint {cp}");
        }
        eprintln!("  checkpoint {cp} verified");
    }
    Ok(())
}
