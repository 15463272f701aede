use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::fields::string::expect_str;
use crate::value::{FieldValue, Value};
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

/// Dotted-quad IPv4 address
#[derive(Debug, Clone)]
pub struct IPv4AddressField {
    base: FieldBase,
}

impl IPv4AddressField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
        }
    }
}

impl Field for IPv4AddressField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "ipv4".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;
        let addr: Ipv4Addr = text
            .parse()
            .map_err(|_| ConfigError::validation(self.name(), "must be a valid IPv4 address"))?;
        Ok(FieldValue::Basic(Value::String(addr.to_string())))
    }
}

/// IPv4 network in CIDR notation, `A.B.C.D/Z`, with no host bits set
#[derive(Debug, Clone)]
pub struct IPv4NetworkField {
    base: FieldBase,
}

impl IPv4NetworkField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
        }
    }
}

fn parse_network(text: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, prefix) = match text.split_once('/') {
        Some((addr, prefix)) => (addr, prefix.parse::<u8>().ok()?),
        None => (text, 32),
    };
    let addr: Ipv4Addr = addr.parse().ok()?;
    if prefix > 32 {
        return None;
    }
    let mask = u32::MAX.checked_shl(u32::from(32 - prefix)).unwrap_or(0);
    if u32::from(addr) & !mask != 0 {
        return None;
    }
    Some((addr, prefix))
}

impl Field for IPv4NetworkField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "ipv4 network".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;
        let (addr, prefix) = parse_network(text).ok_or_else(|| {
            ConfigError::validation(self.name(), "must be a valid IPv4 Network (CIDR notation)")
        })?;
        Ok(FieldValue::Basic(Value::String(format!("{}/{}", addr, prefix))))
    }
}

/// Network hostname, optionally an IPv4 address or resolved to one
#[derive(Debug, Clone)]
pub struct HostnameField {
    base: FieldBase,
    allow_ipv4: bool,
    resolve: bool,
}

impl HostnameField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            allow_ipv4: true,
            resolve: false,
        }
    }

    /// Whether a literal IPv4 address is accepted (default true)
    pub fn allow_ipv4(mut self, allow: bool) -> Self {
        self.allow_ipv4 = allow;
        self
    }

    /// Resolve hostnames to their IPv4 address, failing when resolution fails
    pub fn resolve(mut self, resolve: bool) -> Self {
        self.resolve = resolve;
        self
    }
}

impl_field_options!(IPv4AddressField, IPv4NetworkField, HostnameField);

fn is_dns_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

fn is_netbios_name(text: &str) -> bool {
    let len = text.chars().count();
    (1..=15).contains(&len)
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || "!@#$%^()-'{}.~".contains(c))
}

impl Field for HostnameField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "hostname".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;

        if let Ok(addr) = text.parse::<Ipv4Addr>() {
            if self.allow_ipv4 {
                return Ok(FieldValue::Basic(Value::String(addr.to_string())));
            }
            return Err(ConfigError::validation(self.name(), "is not a valid DNS hostname"));
        }

        if self.resolve {
            let resolved = (text, 0)
                .to_socket_addrs()
                .ok()
                .and_then(|mut addrs| {
                    addrs.find_map(|addr| match addr.ip() {
                        IpAddr::V4(ip) => Some(ip),
                        IpAddr::V6(_) => None,
                    })
                })
                .ok_or_else(|| ConfigError::validation(self.name(), "DNS resolution failed"))?;
            tracing::debug!(host = text, %resolved, "resolved hostname");
            return Ok(FieldValue::Basic(Value::String(resolved.to_string())));
        }

        if !is_dns_name(text) && !is_netbios_name(text) {
            return Err(ConfigError::validation(self.name(), "is not a valid hostname"));
        }
        Ok(value)
    }
}
