use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use matfile::{MatFile, NumericData};

use super::VectorRecord;
use crate::amplitude::PeakTracker;
use crate::cancel::CancelFlag;
use crate::error::EncodeError;

/// Element class of a structured record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
}

/// Shape and type of a record, available before its data is materialized
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDescriptor {
    /// Position of the record in the file
    pub index: usize,
    pub name: String,
    pub dims: Vec<usize>,
    pub class: ElementClass,
    pub is_complex: bool,
}

impl VectorDescriptor {
    /// Rank 2 with one axis of length 1
    pub fn is_vector(&self) -> bool {
        self.dims.len() == 2 && self.dims.contains(&1)
    }

    pub fn length(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Record-at-a-time access to a container of named numeric vectors.
/// Dropping the source closes it.
pub trait VectorSource {
    /// Describe the next record, or None when the records are exhausted
    fn next_record_info(&mut self) -> Result<Option<VectorDescriptor>, EncodeError>;

    /// Materialize the data of a record returned by `next_record_info`
    fn read_record_data(&mut self, descriptor: &VectorDescriptor) -> Result<VectorRecord, EncodeError>;
}

/// MATLAB level-5 `.mat` file
pub struct MatSource {
    mat: MatFile,
    next: usize,
}

impl MatSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EncodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EncodeError::FileOpen(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EncodeError> {
        let mat = MatFile::parse(reader).map_err(|e| EncodeError::FileOpen(format!("not a MAT file: {:?}", e)))?;
        debug!("MAT file holds {} array(s)", mat.arrays().len());
        Ok(Self { mat, next: 0 })
    }
}

impl VectorSource for MatSource {
    fn next_record_info(&mut self) -> Result<Option<VectorDescriptor>, EncodeError> {
        let index = self.next;
        let array = match self.mat.arrays().get(index) {
            Some(array) => array,
            None => return Ok(None),
        };
        self.next += 1;

        let (class, is_complex) = describe(array.data());
        Ok(Some(VectorDescriptor {
            index,
            name: array.name().to_string(),
            dims: array.size().to_vec(),
            class,
            is_complex,
        }))
    }

    fn read_record_data(&mut self, descriptor: &VectorDescriptor) -> Result<VectorRecord, EncodeError> {
        let array = self
            .mat
            .arrays()
            .get(descriptor.index)
            .ok_or_else(|| EncodeError::FileOpen(format!("record {} vanished", descriptor.index)))?;

        match array.data() {
            NumericData::Double { real, imag: Some(imag) } => {
                Ok(VectorRecord::complex(array.name(), real.clone(), imag.clone()))
            }
            NumericData::Double { real, imag: None } => Ok(VectorRecord::real(array.name(), real.clone())),
            _ => Err(EncodeError::DimensionMismatch(format!(
                "'{}' is {:?}, expected double",
                array.name(),
                descriptor.class
            ))),
        }
    }
}

fn describe(data: &NumericData) -> (ElementClass, bool) {
    match data {
        NumericData::Double { imag, .. } => (ElementClass::Double, imag.is_some()),
        NumericData::Single { imag, .. } => (ElementClass::Single, imag.is_some()),
        NumericData::Int8 { imag, .. } => (ElementClass::Int8, imag.is_some()),
        NumericData::UInt8 { imag, .. } => (ElementClass::UInt8, imag.is_some()),
        NumericData::Int16 { imag, .. } => (ElementClass::Int16, imag.is_some()),
        NumericData::UInt16 { imag, .. } => (ElementClass::UInt16, imag.is_some()),
        NumericData::Int32 { imag, .. } => (ElementClass::Int32, imag.is_some()),
        NumericData::UInt32 { imag, .. } => (ElementClass::UInt32, imag.is_some()),
        NumericData::Int64 { imag, .. } => (ElementClass::Int64, imag.is_some()),
        NumericData::UInt64 { imag, .. } => (ElementClass::UInt64, imag.is_some()),
    }
}

/// Records already in memory, served in order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<VectorRecord>,
    next: usize,
}

impl MemorySource {
    pub fn new(records: Vec<VectorRecord>) -> Self {
        Self { records, next: 0 }
    }
}

impl VectorSource for MemorySource {
    fn next_record_info(&mut self) -> Result<Option<VectorDescriptor>, EncodeError> {
        let index = self.next;
        let record = match self.records.get(index) {
            Some(record) => record,
            None => return Ok(None),
        };
        self.next += 1;

        Ok(Some(VectorDescriptor {
            index,
            name: record.name.clone(),
            dims: vec![record.length, 1],
            class: ElementClass::Double,
            is_complex: record.is_complex,
        }))
    }

    fn read_record_data(&mut self, descriptor: &VectorDescriptor) -> Result<VectorRecord, EncodeError> {
        self.records
            .get(descriptor.index)
            .cloned()
            .ok_or_else(|| EncodeError::FileOpen(format!("record {} vanished", descriptor.index)))
    }
}

/// Vectors read from a structured source with their combined peak magnitude
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSet {
    pub vectors: Vec<VectorRecord>,
    pub max_abs: f64,
}

/// Read up to `limit` double-precision vectors from `source`
pub fn read_vectors<S: VectorSource>(source: &mut S, limit: usize, cancel: &CancelFlag) -> Result<VectorSet, EncodeError> {
    let mut vectors = Vec::new();
    let mut peak = PeakTracker::new();

    while vectors.len() < limit {
        cancel.check()?;
        let descriptor = match source.next_record_info()? {
            Some(d) => d,
            None => break,
        };
        debug!(
            "Record {} '{}': dims {:?}, {:?}{}",
            descriptor.index,
            descriptor.name,
            descriptor.dims,
            descriptor.class,
            if descriptor.is_complex { ", complex" } else { "" }
        );

        if !descriptor.is_vector() {
            return Err(EncodeError::DimensionMismatch(format!(
                "'{}' has dims {:?}, expected a vector",
                descriptor.name, descriptor.dims
            )));
        }
        if descriptor.class != ElementClass::Double {
            return Err(EncodeError::DimensionMismatch(format!(
                "'{}' is {:?}, expected double",
                descriptor.name, descriptor.class
            )));
        }

        let record = source.read_record_data(&descriptor)?;
        peak.observe_all(record.samples());
        vectors.push(record);
    }

    if vectors.is_empty() {
        return Err(EncodeError::FileOpen("no vector records in file".into()));
    }

    Ok(VectorSet {
        vectors,
        max_abs: peak.max_abs(),
    })
}
