//! Labeled datasets: the IDX (MNIST) loader and a small in-memory variant.
use anyhow::{anyhow, bail, Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Number of digit classes in MNIST.
pub const MNIST_CLASSES: usize = 10;

const LABEL_MAGIC: u32 = 2049;
const IMAGE_MAGIC: u32 = 2051;

/// One-hot encode
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; num_classes];
    if label < num_classes {
        v[label] = 1.0;
    }
    v
}

/// What the training driver needs from a dataset.
pub trait LabeledDataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feature vector of sample `index`.
    fn input(&self, index: usize) -> Vec<f64>;

    /// Class id of sample `index`.
    fn label(&self, index: usize) -> usize;

    fn num_classes(&self) -> usize;

    fn one_hot(&self, index: usize) -> Vec<f64> {
        one_hot(self.label(index), self.num_classes())
    }
}

/// Images and labels decoded from a pair of IDX files.
#[derive(Debug, Clone)]
pub struct MnistDataSet {
    num_images: usize,
    num_rows: usize,
    num_columns: usize,
    images: Vec<u8>,
    labels: Vec<u8>,
}

impl MnistDataSet {
    /// Load an image file and a label file. Paths ending in `.gz` are gunzipped.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(image_file: P, label_file: Q) -> Result<Self> {
        let image_file = image_file.as_ref();
        let label_file = label_file.as_ref();
        let images = open_idx(image_file)?;
        let labels = open_idx(label_file)?;
        let set = Self::from_readers(images, labels)
            .with_context(|| format!("Failed to load {} / {}", image_file.display(), label_file.display()))?;
        info!(
            images = set.num_images,
            rows = set.num_rows,
            columns = set.num_columns,
            "loaded {}",
            image_file.display()
        );
        Ok(set)
    }

    /// Decode already-opened (uncompressed) IDX streams.
    pub fn from_readers<R: Read, S: Read>(mut images: R, mut labels: S) -> Result<Self> {
        let magic = labels.read_u32::<BigEndian>().context("Read label magic")?;
        if magic != LABEL_MAGIC {
            bail!("Invalid label magic: {}", magic);
        }
        let num_labels = labels.read_u32::<BigEndian>().context("Read label count")? as usize;
        let label_bytes = read_payload(&mut labels, num_labels, "Label")?;

        let magic = images.read_u32::<BigEndian>().context("Read image magic")?;
        if magic != IMAGE_MAGIC {
            bail!("Invalid image magic: {}", magic);
        }
        let num_images = images.read_u32::<BigEndian>().context("Read image count")? as usize;
        let num_rows = images.read_u32::<BigEndian>().context("Read row count")? as usize;
        let num_columns = images.read_u32::<BigEndian>().context("Read column count")? as usize;
        if num_images != num_labels {
            bail!("{} images but {} labels", num_images, num_labels);
        }
        let image_len = num_images
            .checked_mul(num_rows)
            .and_then(|n| n.checked_mul(num_columns))
            .ok_or_else(|| {
                anyhow!(
                    "Image header too large: {} x {} x {}",
                    num_images,
                    num_rows,
                    num_columns
                )
            })?;
        let image_bytes = read_payload(&mut images, image_len, "Image")?;

        if let Some(bad) = label_bytes.iter().find(|&&l| l as usize >= MNIST_CLASSES) {
            bail!("Label {} out of range", bad);
        }

        Ok(Self {
            num_images,
            num_rows,
            num_columns,
            images: image_bytes,
            labels: label_bytes,
        })
    }

    pub fn num_images(&self) -> usize {
        self.num_images
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Pixels per image.
    pub fn image_size(&self) -> usize {
        self.num_rows * self.num_columns
    }

    /// Raw pixels of image `index`, row-major.
    pub fn image(&self, index: usize) -> &[u8] {
        let size = self.image_size();
        &self.images[index * size..(index + 1) * size]
    }

    /// Pixels scaled by 1/256 into `[0, 1)`.
    pub fn image_f64(&self, index: usize) -> Vec<f64> {
        self.image(index).iter().map(|&p| p as f64 / 256.0).collect()
    }

    pub fn label_u8(&self, index: usize) -> u8 {
        self.labels[index]
    }

    pub fn label_one_hot(&self, index: usize) -> Vec<f64> {
        one_hot(self.labels[index] as usize, MNIST_CLASSES)
    }
}

impl LabeledDataset for MnistDataSet {
    fn len(&self) -> usize {
        self.num_images
    }

    fn input(&self, index: usize) -> Vec<f64> {
        self.image_f64(index)
    }

    fn label(&self, index: usize) -> usize {
        self.labels[index] as usize
    }

    fn num_classes(&self) -> usize {
        MNIST_CLASSES
    }
}

/// Read exactly `len` bytes, growing the buffer as data arrives so a bogus
/// header length cannot force a huge allocation.
fn read_payload<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| anyhow!("Read {} data: {}", what.to_lowercase(), e))?;
    if buf.len() != len {
        bail!("{} data truncated: expected {} bytes, got {}", what, len, buf.len());
    }
    Ok(buf)
}

fn open_idx(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Locate the standard MNIST file pair for the training or test split in
/// `dir`, preferring uncompressed files over `.gz`.
pub fn mnist_paths(dir: &Path, train: bool) -> Result<(std::path::PathBuf, std::path::PathBuf)> {
    let prefix = if train { "train" } else { "t10k" };
    let find = |stem: String| {
        let plain = dir.join(&stem);
        let gz = dir.join(format!("{}.gz", stem));
        if plain.exists() {
            Ok(plain)
        } else if gz.exists() {
            Ok(gz)
        } else {
            Err(anyhow!("Neither {} nor {} exists", plain.display(), gz.display()))
        }
    };
    let images = find(format!("{}-images-idx3-ubyte", prefix))?;
    let labels = find(format!("{}-labels-idx1-ubyte", prefix))?;
    Ok((images, labels))
}

/// Samples held in memory as `(features, class)` pairs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    samples: Vec<(Vec<f64>, usize)>,
    num_classes: usize,
}

impl InMemoryDataset {
    pub fn new(samples: Vec<(Vec<f64>, usize)>, num_classes: usize) -> Self {
        Self {
            samples,
            num_classes,
        }
    }

    pub fn push(&mut self, input: Vec<f64>, label: usize) {
        self.samples.push((input, label));
    }

    pub fn samples(&self) -> &[(Vec<f64>, usize)] {
        &self.samples
    }
}

impl LabeledDataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn input(&self, index: usize) -> Vec<f64> {
        self.samples[index].0.clone()
    }

    fn label(&self, index: usize) -> usize {
        self.samples[index].1
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}
