use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use seqmgr_tonic_core::{
    seqmgr::{
        Durability, SEQ_META_CHUNK, SEQ_SPACE_LIMIT, SEQ_SPACE_START, SEQ_SUPER_CHUNK, SeqConfig,
    },
    types::DEFAULT_ADDR,
};
use std::path::PathBuf;

/// Which part of the hierarchy this process plays.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    /// Owns the whole sequence space and grants super-ranges.
    Controller,
    /// Leases super-ranges from a controller and grants meta-ranges.
    Regular,
}

/// Runtime configuration for the `seqmgr-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is honored). Every process in a deployment must agree on the
/// chunk sizes and the space start, or ranges from different servers may be
/// sized inconsistently.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "seqmgr-server",
    version,
    about = "A gRPC sequence manager leasing FID sequence ranges"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/seqmgr.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Role of this server.
    ///
    /// Exactly one controller should own a given sequence space.
    ///
    /// Environment variable: `ROLE`
    #[arg(long, env = "ROLE", value_enum, default_value_t = RoleArg::Controller)]
    pub role: RoleArg,

    /// URL of the controller a regular server leases super-ranges from.
    ///
    /// Example: "http://10.0.0.1:50051"
    ///
    /// Environment variable: `CONTROLLER_URL`
    #[arg(long, env = "CONTROLLER_URL")]
    pub controller_url: Option<String>,

    /// File holding the persisted allocator state.
    ///
    /// Without it state lives in memory and a restart forgets every grant,
    /// which is only safe for throwaway deployments.
    ///
    /// Environment variable: `STATE_PATH`
    #[arg(long, env = "STATE_PATH")]
    pub state_path: Option<PathBuf>,

    /// Number of sequences per meta-range granted to a client.
    ///
    /// Environment variable: `META_CHUNK`
    #[arg(long, env = "META_CHUNK", default_value_t = SEQ_META_CHUNK)]
    pub meta_chunk: u64,

    /// Number of sequences per super-range granted to a regular server.
    ///
    /// Environment variable: `SUPER_CHUNK`
    #[arg(long, env = "SUPER_CHUNK", default_value_t = SEQ_SUPER_CHUNK)]
    pub super_chunk: u64,

    /// First sequence of the space owned by the controller.
    ///
    /// Environment variable: `SPACE_START`
    #[arg(long, env = "SPACE_START", default_value_t = SEQ_SPACE_START)]
    pub space_start: u64,

    /// Fail a grant (and roll it back) when its state cannot be persisted,
    /// instead of logging and serving it anyway.
    ///
    /// Environment variable: `STRICT_DURABILITY`
    #[arg(long, env = "STRICT_DURABILITY", default_value_t = false)]
    pub strict_durability: bool,
}

/// Validated upstream choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleConfig {
    Controller,
    Regular { controller_url: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub role: RoleConfig,
    pub state_path: Option<PathBuf>,
    pub seq: SeqConfig,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let role = match (args.role, args.controller_url) {
            (RoleArg::Controller, None) => RoleConfig::Controller,
            (RoleArg::Controller, Some(_)) => {
                bail!("CONTROLLER_URL is only valid with ROLE=regular")
            }
            (RoleArg::Regular, Some(controller_url)) => RoleConfig::Regular { controller_url },
            (RoleArg::Regular, None) => bail!("ROLE=regular requires CONTROLLER_URL"),
        };

        if args.server_addr.is_empty() {
            bail!("SERVER_ADDR must not be empty");
        }

        if args.super_chunk < args.meta_chunk {
            bail!(
                "SUPER_CHUNK ({}) must be at least META_CHUNK ({})",
                args.super_chunk,
                args.meta_chunk
            );
        }

        let durability = if args.strict_durability {
            Durability::Strict
        } else {
            Durability::BestEffort
        };
        let seq = SeqConfig::default()
            .with_space(args.space_start, SEQ_SPACE_LIMIT)
            .with_super_chunk(args.super_chunk)
            .with_meta_chunk(args.meta_chunk)
            .with_durability(durability);
        seq.validate().context("invalid sequence configuration")?;

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            role,
            state_path: args.state_path,
            seq,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_ADDR.to_string(),
            uds: false,
            role: RoleConfig::Controller,
            state_path: None,
            seq: SeqConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = core::iter::once("seqmgr-server").chain(args.iter().copied());
        ServerConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_to_an_in_memory_controller() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.role, RoleConfig::Controller);
        assert!(config.state_path.is_none());
        assert_eq!(config.seq.meta_chunk, SEQ_META_CHUNK);
        assert_eq!(config.seq.durability, Durability::BestEffort);
    }

    #[test]
    fn regular_needs_a_controller_url() {
        assert!(parse(&["--role", "regular"]).is_err());
        let config = parse(&[
            "--role",
            "regular",
            "--controller-url",
            "http://127.0.0.1:50051",
        ])
        .unwrap();
        assert_eq!(
            config.role,
            RoleConfig::Regular {
                controller_url: "http://127.0.0.1:50051".into()
            }
        );
    }

    #[test]
    fn controller_rejects_a_controller_url() {
        assert!(parse(&["--controller-url", "http://127.0.0.1:50051"]).is_err());
    }

    #[test]
    fn chunk_sizes_are_validated() {
        assert!(parse(&["--meta-chunk", "0"]).is_err());
        assert!(parse(&["--super-chunk", "10", "--meta-chunk", "20"]).is_err());
        let config = parse(&["--super-chunk", "100", "--meta-chunk", "10", "--strict-durability"])
            .unwrap();
        assert_eq!(config.seq.super_chunk, 100);
        assert_eq!(config.seq.durability, Durability::Strict);
    }
}
