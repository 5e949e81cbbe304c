//! Turning a decoded image into the model's input tensor

use crate::config::{Normalization, Settings};
use anyhow::Result;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tch::Tensor;

/// Per-channel means subtracted in `Normalization::Caffe`, in BGR order
const CAFFE_MEAN_BGR: [f32; 3] = [103.939, 116.779, 123.68];

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resizes and normalizes images into a single-item batch
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    width: u32,
    height: u32,
    normalization: Normalization,
    channels_last: bool,
}

impl Preprocessor {
    pub fn new(width: u32, height: u32, normalization: Normalization, channels_last: bool) -> Self {
        Preprocessor {
            width,
            height,
            normalization,
            channels_last,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.image_width,
            settings.image_height,
            settings.normalization,
            settings.channels_last,
        )
    }

    /// Shape of the batch produced by `to_tensor`
    pub fn input_shape(&self) -> [i64; 4] {
        let (h, w) = (self.height as i64, self.width as i64);
        if self.channels_last {
            [1, h, w, 3]
        } else {
            [1, 3, h, w]
        }
    }

    /// Resize to the model's input size and flatten into normalized floats,
    /// laid out as `input_shape` without the batch dimension
    pub fn pixels(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb: RgbImage = image
            .resize_exact(self.width, self.height, FilterType::Nearest)
            .to_rgb8();
        let plane = self.width as usize * self.height as usize;
        let mut data = vec![0f32; plane * 3];

        for (i, pixel) in rgb.pixels().enumerate() {
            let values = self.normalize(pixel.0);
            for (c, v) in values.into_iter().enumerate() {
                let at = if self.channels_last { i * 3 + c } else { c * plane + i };
                data[at] = v;
            }
        }
        data
    }

    /// Build the `[1, ...]` input batch for one image
    pub fn to_tensor(&self, image: &DynamicImage) -> Result<Tensor> {
        let data = self.pixels(image);
        let shape = self.input_shape();
        Ok(Tensor::from_slice(&data).f_reshape(&shape[..])?)
    }

    fn normalize(&self, [r, g, b]: [u8; 3]) -> [f32; 3] {
        let rgb = [r as f32, g as f32, b as f32];
        match self.normalization {
            Normalization::Caffe => [
                rgb[2] - CAFFE_MEAN_BGR[0],
                rgb[1] - CAFFE_MEAN_BGR[1],
                rgb[0] - CAFFE_MEAN_BGR[2],
            ],
            Normalization::Imagenet => {
                let mut out = [0f32; 3];
                for c in 0..3 {
                    out[c] = (rgb[c] / 255. - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
                }
                out
            }
            Normalization::Unit => rgb.map(|v| v / 255.),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_caffe_bgr_mean_subtraction() {
        let pre = Preprocessor::new(4, 2, Normalization::Caffe, false);
        let data = pre.pixels(&solid(10, 7, [200, 100, 50]));
        assert_eq!(data.len(), 3 * 4 * 2);

        // NCHW: one plane per channel, blue first
        assert!(data[..8].iter().all(|v| close(*v, 50. - 103.939)));
        assert!(data[8..16].iter().all(|v| close(*v, 100. - 116.779)));
        assert!(data[16..].iter().all(|v| close(*v, 200. - 123.68)));
    }

    #[test]
    fn test_channels_last_interleaves() {
        let pre = Preprocessor::new(3, 3, Normalization::Unit, true);
        let data = pre.pixels(&solid(5, 5, [255, 0, 51]));
        for px in data.chunks(3) {
            assert!(close(px[0], 1.0));
            assert!(close(px[1], 0.0));
            assert!(close(px[2], 0.2));
        }
        assert_eq!(pre.input_shape(), [1, 3, 3, 3]);
    }

    #[test]
    fn test_imagenet_normalization() {
        let pre = Preprocessor::new(1, 1, Normalization::Imagenet, false);
        let data = pre.pixels(&solid(2, 2, [0, 255, 0]));
        assert!(close(data[0], -0.485 / 0.229));
        assert!(close(data[1], (1. - 0.456) / 0.224));
        assert!(close(data[2], -0.406 / 0.225));
    }

    #[test]
    fn test_tensor_shape() {
        let pre = Preprocessor::new(128, 96, Normalization::Caffe, false);
        let tensor = pre.to_tensor(&solid(640, 480, [10, 20, 30])).unwrap();
        assert_eq!(tensor.size(), vec![1, 3, 96, 128]);
    }
}
