//! Network exposure analysis of firewall-like resources
//!
//! Reads ingress or egress blocks from a resource's after-state, either a
//! nested `ingress`/`egress` list (security groups) or the resource itself
//! when it carries rule attributes at top level (standalone rule resources).
//! A block is unrestricted when its peer range includes `0.0.0.0/0` or `::/0`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tfgate_types::{value_kind, ResourceChange};

use crate::error::RuleFault;

const OPEN_V4: &str = "0.0.0.0/0";
const OPEN_V6: &str = "::/0";
const MAX_PORT: i64 = 65_535;

/// Traffic direction of the analysed blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ingress,
    Egress,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ingress => "ingress",
            Direction::Egress => "egress",
        }
    }
}

/// Which exposures a predicate matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureLevel {
    /// Unrestricted source on all ports or on a sensitive port
    Critical,
    /// Unrestricted source on non-sensitive ports only
    Public,
}

/// Worst exposure found on a resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Exposure {
    /// Unrestricted, non-sensitive ports
    OtherPorts,
    /// Unrestricted, covering these sensitive ports
    SensitivePorts(Vec<u16>),
    /// Unrestricted, every port
    AllPorts,
}

impl Exposure {
    pub fn level(&self) -> ExposureLevel {
        match self {
            Exposure::OtherPorts => ExposureLevel::Public,
            Exposure::SensitivePorts(_) | Exposure::AllPorts => ExposureLevel::Critical,
        }
    }
}

/// Worst unrestricted exposure of `change` in `direction`, if any.
pub fn analyze(
    change: &ResourceChange,
    direction: Direction,
    sensitive_ports: &BTreeSet<u16>,
) -> Result<Option<Exposure>, RuleFault> {
    let Some(after) = &change.after else {
        return Ok(None);
    };

    let key = direction.as_str();
    let mut worst: Option<Exposure> = None;
    match after.get(key) {
        Some(Value::Array(blocks)) => {
            for block in blocks {
                let Value::Object(block) = block else {
                    return Err(type_fault(change, key, "a list of objects", block));
                };
                let exposure = BlockReader::new(change, block).exposure(sensitive_ports)?;
                worst = worst.max(exposure);
            }
        }
        Some(Value::Null) | None => {
            if standalone_direction(change, after) == Some(direction) {
                let block: Map<String, Value> =
                    after.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                worst = BlockReader::new(change, &block).exposure(sensitive_ports)?;
            }
        }
        Some(other) => return Err(type_fault(change, key, "array", other)),
    }
    Ok(worst)
}

/// Direction of a standalone rule resource, `None` when `after` is not one.
fn standalone_direction(
    change: &ResourceChange,
    after: &tfgate_types::Attributes,
) -> Option<Direction> {
    let has_rule_shape = ["from_port", "cidr_blocks", "cidr_ipv4", "cidr_ipv6"]
        .iter()
        .any(|key| after.contains_key(*key));
    if !has_rule_shape {
        return None;
    }
    let is_egress = after.get("type").and_then(Value::as_str) == Some("egress")
        || change.resource_kind.ends_with("_egress_rule");
    Some(if is_egress {
        Direction::Egress
    } else {
        Direction::Ingress
    })
}

fn type_fault(
    change: &ResourceChange,
    attribute: &str,
    expected: &'static str,
    found: &Value,
) -> RuleFault {
    RuleFault::UnexpectedType {
        address: change.address.clone(),
        attribute: attribute.to_string(),
        expected,
        found: value_kind(found),
    }
}

struct BlockReader<'a> {
    change: &'a ResourceChange,
    block: &'a Map<String, Value>,
}

impl<'a> BlockReader<'a> {
    fn new(change: &'a ResourceChange, block: &'a Map<String, Value>) -> Self {
        Self { change, block }
    }

    fn exposure(&self, sensitive_ports: &BTreeSet<u16>) -> Result<Option<Exposure>, RuleFault> {
        if !self.is_unrestricted()? {
            return Ok(None);
        }
        let protocol = self.protocol()?;
        if matches!(protocol.as_deref(), Some("-1") | Some("all")) {
            return Ok(Some(Exposure::AllPorts));
        }
        if matches!(
            protocol.as_deref(),
            Some("icmp") | Some("icmpv6") | Some("1") | Some("58")
        ) {
            return Ok(Some(Exposure::OtherPorts));
        }

        let from = self.port("from_port")?;
        let to = self.port("to_port")?;
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        if low == 0 && high == MAX_PORT as u16 {
            return Ok(Some(Exposure::AllPorts));
        }

        let covered: Vec<u16> = sensitive_ports
            .iter()
            .copied()
            .filter(|p| (low..=high).contains(p))
            .collect();
        if covered.is_empty() {
            Ok(Some(Exposure::OtherPorts))
        } else {
            Ok(Some(Exposure::SensitivePorts(covered)))
        }
    }

    fn is_unrestricted(&self) -> Result<bool, RuleFault> {
        for key in ["cidr_blocks", "ipv6_cidr_blocks"] {
            match self.block.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for item in items {
                        let Some(cidr) = item.as_str() else {
                            return Err(type_fault(self.change, key, "a list of strings", item));
                        };
                        if cidr == OPEN_V4 || cidr == OPEN_V6 {
                            return Ok(true);
                        }
                    }
                }
                Some(other) => return Err(type_fault(self.change, key, "array", other)),
            }
        }
        for key in ["cidr_ipv4", "cidr_ipv6"] {
            match self.block.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::String(cidr)) if cidr == OPEN_V4 || cidr == OPEN_V6 => {
                    return Ok(true)
                }
                Some(Value::String(_)) => {}
                Some(other) => return Err(type_fault(self.change, key, "string", other)),
            }
        }
        Ok(false)
    }

    fn protocol(&self) -> Result<Option<String>, RuleFault> {
        for key in ["protocol", "ip_protocol"] {
            match self.block.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::String(p)) => return Ok(Some(p.to_ascii_lowercase())),
                Some(Value::Number(n)) => return Ok(Some(n.to_string())),
                Some(other) => return Err(type_fault(self.change, key, "string", other)),
            }
        }
        Ok(None)
    }

    fn port(&self, key: &str) -> Result<u16, RuleFault> {
        let value = self.block.get(key).filter(|v| !v.is_null()).ok_or_else(|| {
            RuleFault::MissingAttribute {
                address: self.change.address.clone(),
                attribute: key.to_string(),
            }
        })?;
        let number = value
            .as_i64()
            .ok_or_else(|| type_fault(self.change, key, "integer", value))?;
        if !(0..=MAX_PORT).contains(&number) {
            return Err(RuleFault::InvalidPort {
                address: self.change.address.clone(),
                attribute: key.to_string(),
                value: number,
            });
        }
        Ok(number as u16)
    }
}
