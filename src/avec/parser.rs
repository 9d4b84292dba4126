//! Decode session over a single dive buffer.

use thiserror::Error;

use crate::sans::{
    OutOfBounds,
    field::{self, DateTime, Field, FieldError, FieldKind},
    header::{DiveHeader, HeaderError},
    model::{Model, UnknownModel},
    sample::{SampleError, Samples},
};

use super::{FromSamples, publish};

/// Errors occurring while decoding a dive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The model number does not belong to the family.
    #[error(transparent)]
    Model(#[from] UnknownModel),
    /// The buffer failed validation.
    #[error("Invalid dive: {0}")]
    Header(#[from] HeaderError),
    /// The profile is malformed.
    #[error("Invalid profile: {0}")]
    Sample(#[from] SampleError),
    /// A field could not be read.
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
}

/// Broad classes of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The buffer is malformed.
    DataFormat,
    /// The requested value is not recorded by any model.
    Unsupported,
    /// The caller supplied a value outside the accepted range.
    InvalidArgument,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(_) => ErrorKind::InvalidArgument,
            Self::Field(FieldError::Unsupported(_)) => ErrorKind::Unsupported,
            Self::Field(FieldError::IndexOutOfRange { .. }) => ErrorKind::InvalidArgument,
            Self::Header(_) | Self::Sample(_) | Self::Field(_) | Self::OutOfBounds(_) => {
                ErrorKind::DataFormat
            }
        }
    }
}

/// A dive buffer and the header validated from it.
///
/// The buffer is validated the first time a query needs it, and the result
/// is kept until the buffer is replaced with [`set_data`](Parser::set_data).
/// A failed validation is not kept, so every query repeats it.
///
/// # Example
///
/// ```
/// let mut parser = Parser::new(Model::IconHd);
/// parser.set_data(&data);
///
/// let start = parser.datetime()?;
/// let Field::MaxDepth(depth) = parser.field(FieldKind::MaxDepth)? else {
///     unreachable!()
/// };
///
/// for sample in parser.samples()? {
///     println!("{:?}", sample?);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    model: Model,
    data: &'a [u8],
    header: Option<DiveHeader>,
}

impl<'a> Parser<'a> {
    /// Create a session for dives recorded by a model, with an empty buffer.
    pub fn new(model: Model) -> Self {
        Self {
            model,
            data: &[],
            header: None,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Replace the buffer, discarding anything validated from the previous one.
    pub fn set_data(&mut self, data: &'a [u8]) {
        self.data = data;
        self.header = None;
    }

    /// Whether the current buffer has been validated.
    pub fn is_cached(&self) -> bool {
        self.header.is_some()
    }

    /// Validate the buffer, if not yet done, and return its header.
    pub fn header(&mut self) -> Result<&DiveHeader, Error> {
        let header = match &mut self.header {
            Some(header) => header,
            slot @ None => slot.insert(DiveHeader::parse(self.model, self.data)?),
        };
        Ok(header)
    }

    /// The start time of the dive.
    pub fn datetime(&mut self) -> Result<DateTime, Error> {
        let data = self.data;
        Ok(field::datetime(self.header()?, data)?)
    }

    /// A summary value of the dive.
    pub fn field(&mut self, kind: FieldKind) -> Result<Field, Error> {
        let data = self.data;
        Ok(field::read(self.header()?, data, kind).inspect_err(|err| log::error!("{err}"))?)
    }

    /// Walk the profile lazily.
    pub fn samples(&mut self) -> Result<Samples<'_>, Error> {
        let data = self.data;
        Ok(Samples::new(self.header()?, data))
    }

    /// Walk the whole profile, publishing to a receiver.
    ///
    /// Samples published before an error are not withdrawn.
    pub fn samples_foreach(&mut self, o: &mut impl FromSamples) -> Result<(), Error> {
        for sample in self.samples()? {
            publish(o, sample?);
        }

        Ok(())
    }
}

impl TryFrom<u32> for Parser<'_> {
    type Error = Error;

    /// Create a session from a model number.
    fn try_from(number: u32) -> Result<Self, Self::Error> {
        Ok(Self::new(Model::try_from(number)?))
    }
}
