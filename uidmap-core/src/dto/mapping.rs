//! Mapping DTOs

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::domain::work_item::{MappingOperation, WorkItem};
use crate::error::BatchError;

pub const DEFAULT_TIMEOUT: u32 = 3600;
pub const DEFAULT_USER_PREFIX: &str = "domain\\user";
pub const DEFAULT_BASE_IP: &str = "10.0.0.1";

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT
}

fn default_user_prefix() -> String {
    DEFAULT_USER_PREFIX.to_string()
}

fn default_base_ip() -> String {
    DEFAULT_BASE_IP.to_string()
}

/// One user/address mapping sent immediately, outside any job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleMappingRequest {
    pub ip: String,
    pub username: String,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default)]
    pub operation: MappingOperation,
    #[serde(default)]
    pub uia_url: Option<String>,
}

impl SingleMappingRequest {
    pub fn work_item(&self) -> Result<WorkItem, BatchError> {
        let ip = parse_ip(&self.ip)?;
        if self.username.trim().is_empty() {
            return Err(BatchError::EmptyField {
                index: 0,
                field: "username",
            });
        }
        Ok(WorkItem::mapping(
            self.operation,
            ip.to_string(),
            self.username.clone(),
            self.timeout,
        ))
    }
}

/// Count-based bulk mapping
///
/// Item `i` (0-based) maps `base_ip + i` to `user_prefix` followed by `i + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkMappingRequest {
    pub count: usize,
    #[serde(default = "default_user_prefix")]
    pub user_prefix: String,
    #[serde(default = "default_base_ip")]
    pub base_ip: String,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default)]
    pub operation: MappingOperation,
    #[serde(default)]
    pub uia_url: Option<String>,
}

impl BulkMappingRequest {
    /// Expands the request into its work items
    ///
    /// Pure: the same request always yields the same items.
    pub fn work_items(&self) -> Result<Vec<WorkItem>, BatchError> {
        if self.count == 0 {
            return Err(BatchError::Empty);
        }

        let base = parse_ip(&self.base_ip)?;
        let addresses = address_range(base, self.count).ok_or_else(|| {
            BatchError::AddressOverflow {
                base: base.to_string(),
                count: self.count,
            }
        })?;

        Ok(addresses
            .enumerate()
            .map(|(i, ip)| {
                WorkItem::mapping(
                    self.operation,
                    ip.to_string(),
                    format!("{}{}", self.user_prefix, i + 1),
                    self.timeout,
                )
            })
            .collect())
    }
}

/// Mapping of every host address in a subnet
///
/// Host `i` (0-based, in address order) maps to `user_prefix` followed by
/// `i + 1`. The network (and, for IPv4, broadcast) address is skipped unless
/// the prefix leaves only one or two addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetMappingRequest {
    /// CIDR notation, e.g. `10.20.0.0/22`
    pub subnet: String,
    #[serde(default = "default_user_prefix")]
    pub user_prefix: String,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default)]
    pub operation: MappingOperation,
    #[serde(default)]
    pub uia_url: Option<String>,
}

impl SubnetMappingRequest {
    /// Number of items the request expands to, without expanding it
    pub fn host_count(&self) -> Result<u128, BatchError> {
        Ok(Subnet::parse(&self.subnet)?.host_count())
    }

    /// Expands the request into its work items
    ///
    /// Check `host_count` first: a short prefix yields a very large batch.
    pub fn work_items(&self) -> Result<Vec<WorkItem>, BatchError> {
        let subnet = Subnet::parse(&self.subnet)?;
        Ok(subnet
            .hosts()
            .enumerate()
            .map(|(i, ip)| {
                WorkItem::mapping(
                    self.operation,
                    ip.to_string(),
                    format!("{}{}", self.user_prefix, i + 1),
                    self.timeout,
                )
            })
            .collect())
    }
}

/// Parsed CIDR block; addresses are held as `u128` for both families
#[derive(Debug, Clone, Copy)]
struct Subnet {
    network: u128,
    host_bits: u32,
    v6: bool,
}

impl Subnet {
    fn parse(raw: &str) -> Result<Self, BatchError> {
        let invalid = |reason: &str| BatchError::InvalidSubnet {
            subnet: raw.to_string(),
            reason: reason.to_string(),
        };

        let (addr, prefix) = raw
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected address/prefix"))?;
        let addr = parse_ip(addr)?;
        let prefix: u32 = prefix
            .trim()
            .parse()
            .map_err(|_| invalid("prefix is not a number"))?;

        let (network, bits, v6) = match addr {
            IpAddr::V4(v4) => (u128::from(u32::from(v4)), 32, false),
            IpAddr::V6(v6) => (u128::from(v6), 128, true),
        };
        if prefix > bits {
            return Err(invalid("prefix is longer than the address"));
        }

        let subnet = Self {
            network,
            host_bits: bits - prefix,
            v6,
        };
        if network & subnet.host_mask() != 0 {
            return Err(invalid("host bits are set"));
        }
        Ok(subnet)
    }

    fn host_mask(&self) -> u128 {
        match self.host_bits {
            0 => 0,
            bits => u128::MAX >> (128 - bits),
        }
    }

    /// First and last usable host address
    fn host_bounds(&self) -> (u128, u128) {
        let last = self.network + self.host_mask();
        match self.host_bits {
            0 | 1 => (self.network, last),
            _ if self.v6 => (self.network + 1, last),
            _ => (self.network + 1, last - 1),
        }
    }

    fn host_count(&self) -> u128 {
        let (first, last) = self.host_bounds();
        (last - first).saturating_add(1)
    }

    fn hosts(&self) -> impl Iterator<Item = IpAddr> {
        let (first, last) = self.host_bounds();
        let v6 = self.v6;
        (first..=last).map(move |value| {
            if v6 {
                IpAddr::V6(Ipv6Addr::from(value))
            } else {
                IpAddr::V4(Ipv4Addr::from(value as u32))
            }
        })
    }
}

pub(crate) fn parse_ip(raw: &str) -> Result<IpAddr, BatchError> {
    raw.trim()
        .parse::<IpAddr>()
        .map_err(|_| BatchError::InvalidAddress(raw.to_string()))
}

/// `count` consecutive addresses starting at `base`, or `None` if the range
/// leaves the address space
fn address_range(base: IpAddr, count: usize) -> Option<Box<dyn Iterator<Item = IpAddr>>> {
    let span = count.checked_sub(1)?;
    match base {
        IpAddr::V4(v4) => {
            let start = u32::from(v4);
            start.checked_add(u32::try_from(span).ok()?)?;
            Some(Box::new(
                (0..=span as u32).map(move |i| IpAddr::V4(Ipv4Addr::from(start + i))),
            ))
        }
        IpAddr::V6(v6) => {
            let start = u128::from(v6);
            start.checked_add(span as u128)?;
            Some(Box::new(
                (0..=span as u128).map(move |i| IpAddr::V6(Ipv6Addr::from(start + i))),
            ))
        }
    }
}
