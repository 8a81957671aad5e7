//! Permission operations carried by a `PermissionsTx`.

use super::{Address, ParseError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named base or secure-native permission known to the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Root,
    Send,
    Call,
    CreateContract,
    CreateAccount,
    Bond,
    Name,
    HasBase,
    SetBase,
    UnsetBase,
    SetGlobal,
    HasRole,
    AddRole,
    RmRole,
}

impl Permission {
    /// The permission's bit in the ledger's permission flag word.
    pub fn flag(self) -> u64 {
        1 << (self as u64)
    }
}

impl FromStr for Permission {
    type Err = ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let perm = match src {
            "root" => Self::Root,
            "send" => Self::Send,
            "call" => Self::Call,
            "create_contract" => Self::CreateContract,
            "create_account" => Self::CreateAccount,
            "bond" => Self::Bond,
            "name" => Self::Name,
            "has_base" => Self::HasBase,
            "set_base" => Self::SetBase,
            "unset_base" => Self::UnsetBase,
            "set_global" => Self::SetGlobal,
            "has_role" => Self::HasRole,
            "add_role" => Self::AddRole,
            "rm_role" => Self::RmRole,
            other => return Err(ParseError::UnknownPermission(other.to_string())),
        };
        Ok(perm)
    }
}

/// The discriminated payload of a `PermissionsTx`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PermArgs {
    SetBase { address: Address, permission: Permission, value: bool },
    UnsetBase { address: Address, permission: Permission },
    SetGlobal { permission: Permission, value: bool },
    AddRole { address: Address, role: String },
    RmRole { address: Address, role: String },
}

impl PermArgs {
    /// Builds the payload out of a permission function name and its
    /// positional string arguments, the way the command line supplies them.
    pub fn from_strings(perm_func: &str, args: &[String]) -> Result<Self, ParseError> {
        match perm_func {
            "set_base" => {
                expect_args("set_base", 3, args)?;
                Ok(Self::SetBase {
                    address: parse_address(&args[0])?,
                    permission: args[1].parse()?,
                    value: parse_bool(&args[2])?,
                })
            }
            "unset_base" => {
                expect_args("unset_base", 2, args)?;
                Ok(Self::UnsetBase {
                    address: parse_address(&args[0])?,
                    permission: args[1].parse()?,
                })
            }
            "set_global" => {
                expect_args("set_global", 2, args)?;
                Ok(Self::SetGlobal { permission: args[0].parse()?, value: parse_bool(&args[1])? })
            }
            "add_role" => {
                expect_args("add_role", 2, args)?;
                Ok(Self::AddRole { address: parse_address(&args[0])?, role: args[1].clone() })
            }
            "rm_role" => {
                expect_args("rm_role", 2, args)?;
                Ok(Self::RmRole { address: parse_address(&args[0])?, role: args[1].clone() })
            }
            other => Err(ParseError::UnknownPermFunction(other.to_string())),
        }
    }
}

fn expect_args(func: &'static str, want: usize, args: &[String]) -> Result<(), ParseError> {
    if args.len() != want {
        return Err(ParseError::WrongArgCount(func, want, args.len()));
    }
    Ok(())
}

fn parse_address(src: &str) -> Result<Address, ParseError> {
    src.parse()
}

fn parse_bool(src: &str) -> Result<bool, ParseError> {
    match src {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ParseError::InvalidBool(other.to_string())),
    }
}
