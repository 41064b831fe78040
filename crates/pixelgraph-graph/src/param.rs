//! Typed node parameters.
//!
//! Parameters form a closed set of value types. Operations read them at
//! instantiation time through the typed accessors; a wrong type surfaces as
//! [`OpError::InvalidParameter`](crate::OpError::InvalidParameter) before
//! any pixel is touched.

use crate::OpError;
use glam::Mat3;
use pixelgraph_core::{Buffer, Rgba};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A single typed parameter value.
#[derive(Debug, Clone)]
pub enum Param {
    /// Numeric value (radii, opacities, thresholds)
    Float(f64),
    /// Integer value (offsets, bit counts, enum discriminants)
    Int(i64),
    /// Boolean flag
    Bool(bool),
    /// String value (filter names, mode tags)
    Str(String),
    /// Color value
    Color(Rgba),
    /// 3x3 transform matrix
    Matrix(Mat3),
    /// Shared read-only pixel buffer
    Buffer(Arc<Buffer>),
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<Rgba> for Param {
    fn from(v: Rgba) -> Self {
        Self::Color(v)
    }
}

impl From<Mat3> for Param {
    fn from(v: Mat3) -> Self {
        Self::Matrix(v)
    }
}

impl From<Arc<Buffer>> for Param {
    fn from(v: Arc<Buffer>) -> Self {
        Self::Buffer(v)
    }
}

/// An ordered map of named parameters attached to one node.
///
/// Keyed deterministically so that two identically-built graphs behave
/// identically.
#[derive(Debug, Clone, Default)]
pub struct ParamMap {
    values: BTreeMap<String, Param>,
}

impl ParamMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<Param>) -> &mut Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: impl Into<Param>) -> Self {
        self.set(name, value);
        self
    }

    /// Raw access to a parameter.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.values.get(name)
    }

    /// Float parameter, or `default` when absent. Int values widen.
    pub fn float_or(&self, name: &str, default: f64) -> Result<f64, OpError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Param::Float(v)) => Ok(*v),
            Some(Param::Int(v)) => Ok(*v as f64),
            Some(other) => Err(type_error(name, "float", other)),
        }
    }

    /// Integer parameter, or `default` when absent.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, OpError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Param::Int(v)) => Ok(*v),
            Some(other) => Err(type_error(name, "int", other)),
        }
    }

    /// Boolean parameter, or `default` when absent.
    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, OpError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Param::Bool(v)) => Ok(*v),
            Some(other) => Err(type_error(name, "bool", other)),
        }
    }

    /// String parameter, or `default` when absent.
    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str, OpError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Param::Str(v)) => Ok(v),
            Some(other) => Err(type_error(name, "str", other)),
        }
    }

    /// Color parameter, or `default` when absent.
    pub fn color_or(&self, name: &str, default: Rgba) -> Result<Rgba, OpError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Param::Color(v)) => Ok(*v),
            Some(other) => Err(type_error(name, "color", other)),
        }
    }

    /// Mandatory matrix parameter.
    pub fn matrix(&self, name: &str) -> Result<Mat3, OpError> {
        match self.values.get(name) {
            Some(Param::Matrix(v)) => Ok(*v),
            Some(other) => Err(type_error(name, "matrix", other)),
            None => Err(OpError::InvalidParameter(format!(
                "missing required parameter `{name}`"
            ))),
        }
    }

    /// Mandatory buffer parameter.
    pub fn buffer(&self, name: &str) -> Result<Arc<Buffer>, OpError> {
        match self.values.get(name) {
            Some(Param::Buffer(v)) => Ok(Arc::clone(v)),
            Some(other) => Err(type_error(name, "buffer", other)),
            None => Err(OpError::InvalidParameter(format!(
                "missing required parameter `{name}`"
            ))),
        }
    }

    /// Number of parameters set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn type_error(name: &str, wanted: &str, got: &Param) -> OpError {
    let got = match got {
        Param::Float(_) => "float",
        Param::Int(_) => "int",
        Param::Bool(_) => "bool",
        Param::Str(_) => "str",
        Param::Color(_) => "color",
        Param::Matrix(_) => "matrix",
        Param::Buffer(_) => "buffer",
    };
    OpError::InvalidParameter(format!("`{name}` expects {wanted}, got {got}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = ParamMap::new();
        assert_eq!(p.float_or("x", 2.5).unwrap(), 2.5);
        assert_eq!(p.int_or("n", 7).unwrap(), 7);
        assert!(p.bool_or("flag", true).unwrap());
    }

    #[test]
    fn test_typed_access() {
        let p = ParamMap::new()
            .with("radius", 3.0)
            .with("bits", 4)
            .with("linear", true)
            .with("mode", "multiply");
        assert_eq!(p.float_or("radius", 0.0).unwrap(), 3.0);
        assert_eq!(p.int_or("bits", 0).unwrap(), 4);
        assert!(p.bool_or("linear", false).unwrap());
        assert_eq!(p.str_or("mode", "").unwrap(), "multiply");
    }

    #[test]
    fn test_int_widens_to_float() {
        let p = ParamMap::new().with("dx", 5);
        assert_eq!(p.float_or("dx", 0.0).unwrap(), 5.0);
    }

    #[test]
    fn test_type_mismatch() {
        let p = ParamMap::new().with("radius", "big");
        assert!(p.float_or("radius", 0.0).is_err());
    }

    #[test]
    fn test_missing_mandatory() {
        let p = ParamMap::new();
        assert!(p.buffer("buffer").is_err());
        assert!(p.matrix("matrix").is_err());
    }
}
