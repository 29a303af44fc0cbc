//! Conversion between the image model's dense pixel arrays and displayable images.
//!
//! The model answers with a JSON array shaped `[height][width]` (grayscale) or
//! `[height][width][channels]` with 1, 3 or 4 channels of `u8`.

use crate::error::{GenError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use serde::de::{self, DeserializeSeed, SeqAccess, Unexpected, Visitor};
use serde_json::Value;
use std::{fmt, io::Cursor};

/// Pixel layout fixed by the first pixel seen.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Plain,
    Channels(usize),
}

/// Samples streamed straight out of the JSON text into one flat buffer.
#[derive(Default)]
struct PixelBuffer {
    raw: Vec<u8>,
    height: usize,
    width: Option<usize>,
    shape: Option<Shape>,
}

impl PixelBuffer {
    fn check_shape<E: de::Error>(&mut self, shape: Shape) -> std::result::Result<(), E> {
        match self.shape {
            None => {
                self.shape = Some(shape);
                Ok(())
            }
            Some(seen) if seen == shape => Ok(()),
            Some(_) => Err(E::custom("pixels have differing channel counts")),
        }
    }

    fn into_image(self) -> Result<DynamicImage> {
        let width = self.width.unwrap_or(0);
        if self.height == 0 || width == 0 {
            return Err(GenError::Decode("image has no pixels".into()));
        }

        let to_u32 = |n: usize| {
            u32::try_from(n).map_err(|_| GenError::Decode(format!("dimension too large: {}", n)))
        };
        let (width, height) = (to_u32(width)?, to_u32(self.height)?);

        let image = match self.shape {
            Some(Shape::Plain) | Some(Shape::Channels(1)) => {
                GrayImage::from_raw(width, height, self.raw).map(DynamicImage::ImageLuma8)
            }
            Some(Shape::Channels(3)) => {
                RgbImage::from_raw(width, height, self.raw).map(DynamicImage::ImageRgb8)
            }
            Some(Shape::Channels(4)) => {
                RgbaImage::from_raw(width, height, self.raw).map(DynamicImage::ImageRgba8)
            }
            Some(Shape::Channels(n)) => {
                return Err(GenError::Decode(format!(
                    "unsupported channel count: {}",
                    n
                )))
            }
            None => None,
        };

        image.ok_or_else(|| GenError::Decode("buffer does not match dimensions".into()))
    }
}

struct Rows<'a>(&'a mut PixelBuffer);
struct Row<'a>(&'a mut PixelBuffer);
struct Pixel<'a>(&'a mut PixelBuffer);

impl<'de, 'a> DeserializeSeed<'de> for Rows<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a> Visitor<'de> for Rows<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of pixel rows")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        while seq.next_element_seed(Row(&mut *self.0))?.is_some() {
            self.0.height += 1;
        }
        Ok(())
    }
}

impl<'de, 'a> DeserializeSeed<'de> for Row<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a> Visitor<'de> for Row<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of pixels")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let mut width = 0;
        while seq.next_element_seed(Pixel(&mut *self.0))?.is_some() {
            width += 1;
        }

        match self.0.width {
            None => self.0.width = Some(width),
            Some(expected) if expected == width => {}
            Some(_) => return Err(de::Error::custom("rows have differing lengths")),
        }
        Ok(())
    }
}

impl<'de, 'a> DeserializeSeed<'de> for Pixel<'a> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'a> Visitor<'de> for Pixel<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a u8 sample or an array of u8 channels")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<(), E> {
        self.0.check_shape(Shape::Plain)?;
        let sample =
            u8::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))?;
        self.0.raw.push(sample);
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<(), E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
        }
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let mut channels = 0;
        while let Some(sample) = seq.next_element::<u8>()? {
            self.0.raw.push(sample);
            channels += 1;
        }
        self.0.check_shape(Shape::Channels(channels))
    }
}

pub fn decode_image(payload: &str) -> Result<DynamicImage> {
    let invalid = |e: serde_json::Error| {
        GenError::Decode(format!("payload is not a dense u8 pixel array: {}", e))
    };

    let mut buffer = PixelBuffer::default();
    let mut deserializer = serde_json::Deserializer::from_str(payload);
    Rows(&mut buffer).deserialize(&mut deserializer).map_err(invalid)?;
    deserializer.end().map_err(invalid)?;

    buffer.into_image()
}

/// Inverse of [`decode_image`]; this is what the image model sends.
pub fn encode_pixel_array(image: &DynamicImage) -> String {
    let value = match image {
        DynamicImage::ImageLuma8(gray) => Value::from(
            gray.rows()
                .map(|row| Value::from(row.map(|px| px.0[0]).collect::<Vec<u8>>()))
                .collect::<Vec<Value>>(),
        ),
        DynamicImage::ImageRgba8(rgba) => Value::from(
            rgba.rows()
                .map(|row| Value::from(row.map(|px| Value::from(px.0.to_vec())).collect::<Vec<_>>()))
                .collect::<Vec<Value>>(),
        ),
        other => {
            let rgb = other.to_rgb8();
            Value::from(
                rgb.rows()
                    .map(|row| {
                        Value::from(row.map(|px| Value::from(px.0.to_vec())).collect::<Vec<_>>())
                    })
                    .collect::<Vec<Value>>(),
            )
        }
    };
    value.to_string()
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn to_png_data_uri(image: &DynamicImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
