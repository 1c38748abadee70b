// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixture: a small device-inventory schema with hand-written
//! accessor shims over concrete record structs.

use std::collections::HashMap;
use std::sync::Arc;

use oql::{Accessor, OqlError, Record, Schema, TypeNode, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    pub name: String,
    pub vendor: String,
    pub uptime: u64,
    pub cpus: i64,
    pub ports: Vec<Port>,
    pub interfaces: HashMap<String, Port>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Port {
    pub name: String,
    pub speed: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub site: String,
}

impl Record for Device {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn fresh(&self) -> Box<dyn Record> {
        Box::new(Device::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum DeviceField {
    Name,
    Vendor,
    Uptime,
    Cpus,
    PortName,
    PortSpeed,
    InterfaceName,
    LocationSite,
    /// Always fails on `get`; exercises evaluation error paths.
    Flaky,
}

struct DeviceAccessor {
    field: DeviceField,
    path: &'static str,
}

fn device_of(record: &dyn Record) -> Result<&Device, OqlError> {
    record
        .as_any()
        .downcast_ref::<Device>()
        .ok_or_else(|| OqlError::Eval("record is not a Device".to_string()))
}

impl Accessor for DeviceAccessor {
    fn get(&self, record: &dyn Record) -> Result<Value, OqlError> {
        let d = device_of(record)?;
        Ok(match self.field {
            DeviceField::Name => Value::Str(d.name.clone()),
            DeviceField::Vendor => Value::Str(d.vendor.clone()),
            DeviceField::Uptime => Value::Uint(d.uptime),
            DeviceField::Cpus => Value::Int(d.cpus),
            DeviceField::PortName => {
                Value::List(d.ports.iter().map(|p| Value::Str(p.name.clone())).collect())
            }
            DeviceField::PortSpeed => {
                Value::List(d.ports.iter().map(|p| Value::Int(p.speed)).collect())
            }
            DeviceField::InterfaceName => Value::Map(
                d.interfaces
                    .iter()
                    .map(|(k, p)| (k.clone(), Value::Str(p.name.clone())))
                    .collect(),
            ),
            DeviceField::LocationSite => match &d.location {
                Some(location) => Value::Str(location.site.clone()),
                None => Value::Nil,
            },
            DeviceField::Flaky => {
                return Err(OqlError::Eval("flaky accessor".to_string()));
            }
        })
    }

    fn set(&self, record: &mut dyn Record, value: Value) -> Result<(), OqlError> {
        let d = record
            .as_any_mut()
            .downcast_mut::<Device>()
            .ok_or_else(|| OqlError::Eval("record is not a Device".to_string()))?;
        match (self.field, value) {
            (DeviceField::Name, Value::Str(s)) => d.name = s,
            (DeviceField::Vendor, Value::Str(s)) => d.vendor = s,
            (DeviceField::Uptime, Value::Uint(u)) => d.uptime = u,
            (DeviceField::Cpus, Value::Int(i)) => d.cpus = i,
            (field, value) => {
                return Err(OqlError::Eval(format!(
                    "cannot set {field:?} to {value:?}"
                )));
            }
        }
        Ok(())
    }

    fn property_id(&self) -> &str {
        self.path
    }
}

pub struct DeviceSchema;

impl Schema for DeviceSchema {
    fn node(&self, type_name: &str) -> Option<TypeNode> {
        if type_name.eq_ignore_ascii_case("device") {
            Some(TypeNode {
                type_name: "device".to_string(),
            })
        } else {
            None
        }
    }

    fn property_of(&self, path: &str) -> Option<Arc<dyn Accessor>> {
        let (field, path): (DeviceField, &'static str) = match path.to_lowercase().as_str() {
            "device.name" => (DeviceField::Name, "device.name"),
            "device.vendor" => (DeviceField::Vendor, "device.vendor"),
            "device.uptime" => (DeviceField::Uptime, "device.uptime"),
            "device.cpus" => (DeviceField::Cpus, "device.cpus"),
            "device.ports.name" => (DeviceField::PortName, "device.ports.name"),
            "device.ports.speed" => (DeviceField::PortSpeed, "device.ports.speed"),
            "device.interfaces.name" => (DeviceField::InterfaceName, "device.interfaces.name"),
            "device.location.site" => (DeviceField::LocationSite, "device.location.site"),
            "device.flaky" => (DeviceField::Flaky, "device.flaky"),
            _ => return None,
        };
        Some(Arc::new(DeviceAccessor { field, path }))
    }
}
