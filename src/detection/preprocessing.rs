use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::map::map_colors;
use imageproc::morphology::dilate;

type Kernel3 = [[f32; 3]; 3];

/// Local average with a weighted centre, normalised by 13
const SMOOTH_KERNEL: Kernel3 = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
const SMOOTH_SCALE: f32 = 13.0;

/// Laplacian-style edge kernel
const FIND_EDGES_KERNEL: Kernel3 = [[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]];

/// Colour used for pixels darker than the highlight threshold
pub const DARK_HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

/// ITU-R 601-2 luma in 16-bit fixed point; the weights sum to 65536
const LUMA_R: u32 = 19595;
const LUMA_G: u32 = 38470;
const LUMA_B: u32 = 7471;

/// Collapse RGB to one channel with rounded Rec.601 weights
pub fn luminance(img: &RgbImage) -> GrayImage {
    map_colors(img, |p| {
        let [r, g, b] = p.0.map(u32::from);
        Luma([((r * LUMA_R + g * LUMA_G + b * LUMA_B + 0x8000) >> 16) as u8])
    })
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => luminance(&other.to_rgb8()),
    }
}

/// Paint very dark pixels red and keep every other pixel as gray
pub fn highlight_dark(gray: &GrayImage, dark_threshold: u8) -> RgbImage {
    map_colors(gray, |p| {
        if p[0] < dark_threshold {
            DARK_HIGHLIGHT
        } else {
            Rgb([p[0], p[0], p[0]])
        }
    })
}

/// 3x3 convolution per channel; the outermost rows and columns are copied through unfiltered
fn convolve3x3(img: &RgbImage, kernel: &Kernel3, scale: f32) -> RgbImage {
    let (width, height) = img.dimensions();

    RgbImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
            return *img.get_pixel(x, y);
        }
        let mut acc = [0.0f32; 3];
        for (ky, row) in kernel.iter().enumerate() {
            for (kx, &weight) in row.iter().enumerate() {
                let pixel = img.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                for (channel, value) in acc.iter_mut().enumerate() {
                    *value += weight * pixel[channel] as f32;
                }
            }
        }
        Rgb(acc.map(|v| (v / scale).round().clamp(0.0, 255.0) as u8))
    })
}

/// Smooth the image with a small local-average kernel
pub fn smooth(img: &RgbImage) -> RgbImage {
    convolve3x3(img, &SMOOTH_KERNEL, SMOOTH_SCALE)
}

/// Edge response per channel, collapsed to a single intensity channel
pub fn find_edges(img: &RgbImage) -> GrayImage {
    luminance(&convolve3x3(img, &FIND_EDGES_KERNEL, 1.0))
}

/// Pixels at or above `threshold` become 255, the rest 0
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    map_colors(img, |p| if p[0] >= threshold { Luma([255u8]) } else { Luma([0u8]) })
}

/// Max filter over a (2r+1)x(2r+1) window; radius 0 leaves the image unchanged
pub fn max_filter(img: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return img.clone();
    }
    dilate(img, Norm::LInf, radius)
}
