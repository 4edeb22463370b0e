use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use ndarray::{Array3, ArrayView3};

use crate::error::{Result, VistuneError};
use crate::volume::ImagingStack;

pub const STACK_HEADER_SIZE: usize = 34;
pub const STACK_MAGIC: &[u8; 14] = b"VISTUNE-STACK\0";
pub const STACK_VERSION: u32 = 1;

/// Binary stack header (34 bytes, little-endian).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackHeader {
    pub frames: u32,
    pub height: u32,
    pub width: u32,
    pub planes: u32,
}

impl StackHeader {
    pub fn frame_len(&self) -> usize {
        self.height as usize * self.width as usize * self.planes as usize
    }

    /// Total bytes per frame.
    pub fn frame_byte_size(&self) -> usize {
        self.frame_len() * std::mem::size_of::<f32>()
    }
}

/// Memory-mapped reader of a binary stack file.
pub struct StackReader {
    mmap: Mmap,
    pub header: StackHeader,
}

impl StackReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < STACK_HEADER_SIZE {
            return Err(VistuneError::InvalidStack(
                "File too small for stack header".into(),
            ));
        }
        if &mmap[0..14] != STACK_MAGIC {
            return Err(VistuneError::InvalidStack("Missing VISTUNE-STACK magic".into()));
        }

        let mut cursor = std::io::Cursor::new(&mmap[14..STACK_HEADER_SIZE]);
        let version = cursor.read_u32::<LittleEndian>()?;
        if version != STACK_VERSION {
            return Err(VistuneError::InvalidStack(format!(
                "Unsupported stack version {}",
                version
            )));
        }
        let header = StackHeader {
            frames: cursor.read_u32::<LittleEndian>()?,
            height: cursor.read_u32::<LittleEndian>()?,
            width: cursor.read_u32::<LittleEndian>()?,
            planes: cursor.read_u32::<LittleEndian>()?,
        };

        let expected = STACK_HEADER_SIZE + header.frame_byte_size() * header.frames as usize;
        if mmap.len() < expected {
            return Err(VistuneError::InvalidStack(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frames as usize
    }

    /// Decode one time point, shape = (height, width, planes).
    pub fn read_frame(&self, index: usize) -> Result<Array3<f32>> {
        if index >= self.frame_count() {
            return Err(VistuneError::Precondition(format!(
                "frame index {} out of range (total: {})",
                index,
                self.frame_count()
            )));
        }
        let size = self.header.frame_byte_size();
        let offset = STACK_HEADER_SIZE + index * size;
        let mut cursor = std::io::Cursor::new(&self.mmap[offset..offset + size]);
        let mut values = vec![0f32; self.header.frame_len()];
        cursor.read_f32_into::<LittleEndian>(&mut values)?;

        let shape = (
            self.header.height as usize,
            self.header.width as usize,
            self.header.planes as usize,
        );
        Array3::from_shape_vec(shape, values).map_err(|e| VistuneError::InvalidStack(e.to_string()))
    }

    /// Load the whole file into memory.
    pub fn read_stack(&self) -> Result<ImagingStack> {
        let frames: Vec<Array3<f32>> = (0..self.frame_count())
            .map(|i| self.read_frame(i))
            .collect::<Result<_>>()?;
        ImagingStack::from_frames(&frames)
    }
}

/// Streaming writer of a binary stack file.
pub struct StackWriter {
    writer: BufWriter<File>,
    header: StackHeader,
    frames_written: u32,
}

impl StackWriter {
    /// Create the file and write the header.
    pub fn create(path: &Path, header: StackHeader) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(STACK_MAGIC)?;
        writer.write_u32::<LittleEndian>(STACK_VERSION)?;
        writer.write_u32::<LittleEndian>(header.frames)?;
        writer.write_u32::<LittleEndian>(header.height)?;
        writer.write_u32::<LittleEndian>(header.width)?;
        writer.write_u32::<LittleEndian>(header.planes)?;
        Ok(Self {
            writer,
            header,
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, frame: ArrayView3<f32>) -> Result<()> {
        let expected = (
            self.header.height as usize,
            self.header.width as usize,
            self.header.planes as usize,
        );
        if frame.dim() != expected {
            return Err(VistuneError::ShapeMismatch(format!(
                "frame {:?} vs header {:?}",
                frame.dim(),
                expected
            )));
        }
        // Iterating in logical order keeps the layout row-major even for strided views.
        for &v in frame.iter() {
            self.writer.write_f32::<LittleEndian>(v)?;
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Flush and check that the header's frame count was honoured.
    pub fn finalize(mut self) -> Result<()> {
        self.writer.flush()?;
        if self.frames_written != self.header.frames {
            return Err(VistuneError::InvalidStack(format!(
                "wrote {} frames, header declares {}",
                self.frames_written, self.header.frames
            )));
        }
        Ok(())
    }
}

/// Write a whole stack to `path`.
pub fn save_stack(stack: &ImagingStack, path: &Path) -> Result<()> {
    let header = StackHeader {
        frames: stack.frames() as u32,
        height: stack.height() as u32,
        width: stack.width() as u32,
        planes: stack.planes() as u32,
    };
    let mut writer = StackWriter::create(path, header)?;
    for i in 0..stack.frames() {
        writer.write_frame(stack.frame(i))?;
    }
    writer.finalize()
}

/// Read a whole stack from `path`.
pub fn load_stack(path: &Path) -> Result<ImagingStack> {
    StackReader::open(path)?.read_stack()
}
