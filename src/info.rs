//! # NetCDF File Information Module
//!
//! Extracts and displays the structure of a NetCDF file: dimensions,
//! variables with their CF attributes (`standard_name`, `long_name`,
//! `units`) and global attributes. Used to find the variable names to put
//! in a job configuration, and to check that a transcoded file carries the
//! metadata a CF grid reader needs.

use anyhow::{Context, Result};
use log::debug;
use netcdf::AttributeValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Information about a NetCDF dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfDimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// Information about a NetCDF variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfVariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Complete information about a NetCDF file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCdfInfo {
    pub path: String,
    pub dimensions: Vec<NetCdfDimensionInfo>,
    pub variables: Vec<NetCdfVariableInfo>,
    pub global_attributes: BTreeMap<String, String>,
    pub file_size: Option<u64>,
}

/// Extract information from a NetCDF file.
///
/// `variable` restricts the listing to one variable; `detailed` adds
/// global attributes.
pub fn get_netcdf_info(path: &Path, variable: Option<&str>, detailed: bool) -> Result<NetCdfInfo> {
    debug!("Opening NetCDF file: {}", path.display());
    let file = netcdf::open(path)
        .with_context(|| format!("Failed to open NetCDF file: {}", path.display()))?;

    let file_size = std::fs::metadata(path).ok().map(|metadata| metadata.len());

    let dimensions = file
        .dimensions()
        .map(|dim| NetCdfDimensionInfo {
            name: dim.name().to_string(),
            length: dim.len(),
            is_unlimited: dim.is_unlimited(),
        })
        .collect();

    let mut variables = Vec::new();
    for var in file.variables() {
        if variable.is_some_and(|wanted| var.name() != wanted) {
            continue;
        }

        let mut attributes = BTreeMap::new();
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                attributes.insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }

        variables.push(NetCdfVariableInfo {
            name: var.name().to_string(),
            data_type: format!("{:?}", var.vartype()),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            shape: var.dimensions().iter().map(|d| d.len()).collect(),
            standard_name: attributes.get("standard_name").cloned(),
            long_name: attributes.get("long_name").cloned(),
            units: attributes.get("units").cloned(),
            attributes,
        });
    }

    if let Some(wanted) = variable
        && variables.is_empty()
    {
        anyhow::bail!("Variable '{}' not found in {}", wanted, path.display());
    }

    let mut global_attributes = BTreeMap::new();
    if detailed {
        for attr in file.attributes() {
            if let Ok(value) = attr.value() {
                global_attributes.insert(attr.name().to_string(), format_attribute_value(&value));
            }
        }
    }

    file.close().context("Failed to close NetCDF file")?;

    Ok(NetCdfInfo {
        path: path.display().to_string(),
        dimensions,
        variables,
        global_attributes,
        file_size,
    })
}

/// Variables lacking a `standard_name` or `units` attribute.
///
/// A CF grid reader identifies variables by these two attributes only.
/// `time` may legitimately lack units when the source had none, so it is
/// only checked for `standard_name`.
pub fn missing_cf_metadata(info: &NetCdfInfo) -> Vec<String> {
    let mut problems = Vec::new();
    for var in &info.variables {
        if var.standard_name.is_none() {
            problems.push(format!("{}: missing standard_name", var.name));
        }
        if var.units.is_none() && var.name != "time" {
            problems.push(format!("{}: missing units", var.name));
        }
    }
    problems
}

/// Renders text attributes verbatim and numbers without type wrappers.
fn format_attribute_value(value: &AttributeValue) -> String {
    fn join<T: ToString>(values: &[T]) -> String {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
    match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Strs(v) => v.join(", "),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Doubles(v) => join(v),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Floats(v) => join(v),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Ints(v) => join(v),
        AttributeValue::Short(v) => v.to_string(),
        AttributeValue::Shorts(v) => join(v),
        AttributeValue::Longlong(v) => v.to_string(),
        AttributeValue::Longlongs(v) => join(v),
        other => format!("{:?}", other),
    }
}

/// Print NetCDF info in human-readable format
pub fn print_file_info_human(info: &NetCdfInfo) {
    println!("NetCDF File Information:");
    println!("  Path: {}", info.path);
    if let Some(size) = info.file_size {
        println!("  File Size: {:.2} MB", size as f64 / 1_048_576.0);
    }
    println!("  Dimensions: {} total", info.dimensions.len());
    for dim in &info.dimensions {
        println!(
            "    {} ({}{})",
            dim.name,
            dim.length,
            if dim.is_unlimited { ", unlimited" } else { "" }
        );
    }
    println!("  Variables: {} total", info.variables.len());
    for var in &info.variables {
        println!("    Variable: {} ({}) [{}]", var.name, var.data_type, var.dimensions.join(", "));
        println!("      standard_name: {}", var.standard_name.as_deref().unwrap_or("None"));
        println!("      long_name: {}", var.long_name.as_deref().unwrap_or("None"));
        println!("      units: {}", var.units.as_deref().unwrap_or("None"));
    }
    if !info.global_attributes.is_empty() {
        println!("  Global Attributes:");
        for (name, value) in &info.global_attributes {
            println!("    @{}: {}", name, value);
        }
    }
}

/// Print NetCDF info in JSON format
pub fn print_file_info_json(info: &NetCdfInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Print NetCDF info in YAML format
pub fn print_file_info_yaml(info: &NetCdfInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize NetCDF info to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Print NetCDF info in CSV format (variables only)
pub fn print_file_info_csv(info: &NetCdfInfo) {
    println!("variable_name,data_type,dimensions,shape,standard_name,units");
    for var in &info.variables {
        let shape = var
            .shape
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(";");
        println!(
            "{},{},\"{}\",\"{}\",{},{}",
            var.name,
            var.data_type,
            var.dimensions.join(";"),
            shape,
            var.standard_name.as_deref().unwrap_or(""),
            var.units.as_deref().unwrap_or("")
        );
    }
}
