//! mintx — create, sign and broadcast mint ledger transactions.

use clap::{Args, Parser, Subcommand};
use eyre::{bail, eyre, WrapErr};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

use mintx_core::types::{Address, Bytes, PermArgs, PublicKey, Transaction, TxInput};
use mintx_core::utils::address_from_pub_key;
use mintx_providers::{Http, JsonRpcClient, Provider};
use mintx_signers::{Client, RemoteSigner, SubmitOptions};

#[derive(Parser, Debug)]
#[command(name = "mintx", version, about = "Create and broadcast mint ledger transactions")]
struct Opts {
    /// Address of the signing daemon
    #[arg(long, env = "MINTX_SIGN_ADDR", default_value = "http://localhost:4767")]
    sign_addr: Url,

    /// Address of the node's RPC server
    #[arg(long, env = "MINTX_NODE_ADDR", default_value = "http://localhost:46657/")]
    node_addr: Url,

    /// Chain identifier the transaction is scoped to
    #[arg(long, env = "MINTX_CHAIN_ID")]
    chain_id: String,

    /// Sign the transaction using the signing daemon
    #[arg(long)]
    sign: bool,

    /// Broadcast the transaction to the node
    #[arg(long)]
    broadcast: bool,

    /// Wait for the transaction to be committed in a block
    #[arg(long)]
    wait: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Public key of the input account; its address is derived from it
    #[arg(long, env = "MINTX_PUBKEY")]
    pubkey: Option<PublicKey>,

    /// Address of the input account, if no pubkey is given
    #[arg(long)]
    addr: Option<Address>,

    /// Amount for the input
    #[arg(long)]
    amt: Option<u64>,

    /// Account nonce; fetched from the node when omitted
    #[arg(long)]
    nonce: Option<u64>,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Hex encoded data payload
    #[arg(long)]
    data: Option<Bytes>,

    /// File containing a hex encoded data payload
    #[arg(long, conflicts_with = "data")]
    data_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transfer value to an account
    Send {
        #[command(flatten)]
        input: InputArgs,
        /// Destination address
        #[arg(long)]
        to: Address,
    },

    /// Call a contract, or create one when --to is omitted
    Call {
        #[command(flatten)]
        input: InputArgs,
        /// Contract address; omit to create a new contract
        #[arg(long)]
        to: Option<Address>,
        /// Gas limit for the call
        #[arg(long)]
        gas: u64,
        /// Fee to send
        #[arg(long)]
        fee: u64,
        #[command(flatten)]
        data: DataArgs,
    },

    /// Register or update a name registry entry
    Name {
        #[command(flatten)]
        input: InputArgs,
        /// The name to register
        #[arg(long)]
        name: String,
        /// Fee to send
        #[arg(long)]
        fee: u64,
        #[command(flatten)]
        data: DataArgs,
    },

    /// Issue a permission operation: mintx perm <function> <args ...>
    Perm {
        #[command(flatten)]
        input: InputArgs,
        /// Permission function (set_base, unset_base, set_global, add_role, rm_role)
        func: String,
        /// Positional arguments of the permission function
        args: Vec<String>,
    },

    /// Bond a validator
    Bond {
        #[command(flatten)]
        input: InputArgs,
        /// Address to unbond to; defaults to the input's own address
        #[arg(long)]
        unbond_to: Option<Address>,
    },

    /// Unbond a validator
    Unbond {
        /// Validator address
        #[arg(long)]
        addr: Address,
        /// Block height to unbond at
        #[arg(long)]
        height: u64,
    },

    /// Rebond a validator
    Rebond {
        /// Validator address
        #[arg(long)]
        addr: Address,
        /// Block height to rebond at
        #[arg(long)]
        height: u64,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let opts = Opts::parse();

    let provider = Provider::new(Http::new(opts.node_addr.clone()));
    let tx = build_tx(&provider, &opts.command).await?;

    let client = Client::new(provider, opts.node_addr.clone(), opts.chain_id.clone())
        .with_signer(RemoteSigner::new(opts.sign_addr.clone()));

    if !opts.broadcast {
        // dry run: print the (optionally signed) transaction and stop
        let mut tx = tx;
        if opts.sign {
            client.sign_transaction(&mut tx).await?;
        }
        println!("{}", serde_json::to_string_pretty(&tx)?);
        return Ok(());
    }

    let options = SubmitOptions { sign: opts.sign, broadcast: true, wait: opts.wait };
    let outcome = client
        .sign_and_broadcast(tx, options)
        .await?
        .ok_or_else(|| eyre!("broadcast was requested but produced no outcome"))?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn build_tx<P: JsonRpcClient>(
    provider: &Provider<P>,
    command: &Command,
) -> eyre::Result<Transaction> {
    let tx = match command {
        Command::Send { input, to } => {
            let input = resolve_input(provider, input).await?;
            let amount = input.amount;
            Transaction::send(input, *to, amount)
        }
        Command::Call { input, to, gas, fee, data } => {
            let input = resolve_input(provider, input).await?;
            Transaction::call(input, *to, *gas, *fee, resolve_data(data)?)
        }
        Command::Name { input, name, fee, data } => {
            let input = resolve_input(provider, input).await?;
            Transaction::name(input, name.clone(), resolve_data(data)?, *fee)
        }
        Command::Perm { input, func, args } => {
            let input = resolve_perm_input(provider, input).await?;
            Transaction::permissions(input, PermArgs::from_strings(func, args)?)
        }
        Command::Bond { input, unbond_to } => {
            let resolved = resolve_input(provider, input).await?;
            let unbond_to = unbond_to.unwrap_or(resolved.address);
            let amount = resolved.amount;
            Transaction::bond(resolved, unbond_to, amount)
        }
        Command::Unbond { addr, height } => Transaction::unbond(*addr, *height),
        Command::Rebond { addr, height } => Transaction::rebond(*addr, *height),
    };
    Ok(tx)
}

/// Validates the input flags and fills in what the node can provide, before
/// anything is signed or submitted.
async fn resolve_input<P: JsonRpcClient>(
    provider: &Provider<P>,
    args: &InputArgs,
) -> eyre::Result<TxInput> {
    let amount = args
        .amt
        .ok_or_else(|| eyre!("input must specify an amount with the --amt flag"))?;
    build_input(provider, args, amount).await
}

/// Permission operations carry no value; their input amount is fixed at 0.
async fn resolve_perm_input<P: JsonRpcClient>(
    provider: &Provider<P>,
    args: &InputArgs,
) -> eyre::Result<TxInput> {
    build_input(provider, args, 0).await
}

async fn build_input<P: JsonRpcClient>(
    provider: &Provider<P>,
    args: &InputArgs,
    amount: u64,
) -> eyre::Result<TxInput> {
    let address = match (&args.pubkey, &args.addr) {
        (Some(pubkey), _) => address_from_pub_key(pubkey),
        (None, Some(addr)) => *addr,
        (None, None) => bail!("at least one of --pubkey or --addr must be given"),
    };

    let sequence = match args.nonce {
        Some(nonce) => nonce,
        None => provider
            .next_sequence(address)
            .await
            .wrap_err("fetching the nonce from the node; supply --nonce to skip the lookup")?,
    };

    let mut input = TxInput::new(address, amount, sequence);
    if let Some(pubkey) = args.pubkey {
        input = input.with_pub_key(pubkey);
    }
    Ok(input)
}

fn resolve_data(args: &DataArgs) -> eyre::Result<Bytes> {
    if let Some(path) = &args.data_file {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("reading data file {}", path.display()))?;
        return raw.trim().parse().map_err(Into::into);
    }
    Ok(args.data.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn data_and_data_file_are_mutually_exclusive() {
        let err = Opts::try_parse_from([
            "mintx",
            "--chain-id",
            "mint-testnet",
            "call",
            "--addr",
            "9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B",
            "--amt",
            "1",
            "--gas",
            "1000",
            "--fee",
            "2",
            "--data",
            "AA",
            "--data-file",
            "payload.hex",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }
}
