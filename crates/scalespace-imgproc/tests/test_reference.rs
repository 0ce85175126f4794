mod common;

use common::*;
use scalespace_imgproc::filter;
use scalespace_imgproc::kernels::{gaussian_kernel_1d, WindowPolicy};
use scalespace_imgproc::{convolve, FilterError};
use scalespace_tensor::Tensor;

const SHAPE_2D: [usize; 2] = [96, 80];
const SHAPE_3D: [usize; 3] = [24, 40, 44];
const SIGMAS_2D: [f64; 3] = [1.0, 5.0, 10.0];
const SIGMAS_3D: [f64; 3] = [1.0, 5.0, 10.0];
const WINDOWS: [WindowPolicy; 2] = [WindowPolicy::Default, WindowPolicy::Ratio(3.5)];

// f64 paths differ from the reference only in summation order
const TOL_F64: f64 = 1e-10;
const TOL_F32: f64 = 2e-5;
const TOL_EIGEN_F64: f64 = 1e-9;
// mean absolute error of f32 eigenvalues
const MAE_HESSIAN_F32: f64 = 1e-6;
const MAE_STRUCTURE_F32: f64 = 1e-5;

fn component(data: &[f64], c: usize, count: usize) -> Vec<f64> {
    data.iter().skip(c).step_by(count).copied().collect()
}

fn component_f32(data: &[f32], c: usize, count: usize) -> Vec<f64> {
    data.iter().skip(c).step_by(count).map(|&v| v as f64).collect()
}

fn inputs<const N: usize>(shape: [usize; N], seed: u64) -> (Vec<f64>, Tensor<f64, N>, Tensor<f32, N>) {
    let data = random_data(shape.iter().product(), seed);
    let t64 = Tensor::from_shape_vec(shape, data.clone()).expect("shape");
    let t32 = t64.map(|&v| v as f32);
    (data, t64, t32)
}

#[test]
fn convolution_orders_match_reference() -> Result<(), FilterError> {
    let _ = env_logger::builder().is_test(true).try_init();
    let (data, t64, t32) = inputs(SHAPE_2D, 1);
    for sigma in SIGMAS_2D {
        for window in WINDOWS {
            for (o0, o1) in [(0, 0), (1, 0), (0, 1), (2, 0), (1, 2), (2, 2)] {
                let k0 = gaussian_kernel_1d(o0, sigma, window)?;
                let k1 = gaussian_kernel_1d(o1, sigma, window)?;
                let expected = reference_convolve(&data, &SHAPE_2D, &[&k0, &k1]);
                let what = format!("orders ({o0}, {o1}) at sigma {sigma}");

                let out = convolve(&t64.view(), [&k0, &k1], None)?;
                assert_close(out.as_slice(), &expected, TOL_F64, &what);

                let out = convolve(&t32.view(), [&k0, &k1], None)?;
                assert_close(out.as_slice(), &expected, TOL_F32, &what);
            }
        }
    }
    Ok(())
}

#[test]
fn convolution_3d_matches_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_3D, 2);
    for sigma in SIGMAS_3D {
        let k0 = gaussian_kernel_1d(0, sigma, WindowPolicy::Default)?;
        let k1 = gaussian_kernel_1d(1, sigma, WindowPolicy::Default)?;
        let k2 = gaussian_kernel_1d(2, sigma, WindowPolicy::Default)?;
        let expected = reference_convolve(&data, &SHAPE_3D, &[&k2, &k0, &k1]);

        let out = convolve(&t64.view(), [&k2, &k0, &k1], None)?;
        assert_close(out.as_slice(), &expected, TOL_F64, "3-D f64");
        let out = convolve(&t32.view(), [&k2, &k0, &k1], None)?;
        assert_close(out.as_slice(), &expected, TOL_F32, "3-D f32");
    }
    Ok(())
}

#[test]
fn scalar_filters_2d_match_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_2D, 3);
    for sigma in SIGMAS_2D {
        let window = WindowPolicy::Default;

        let expected = reference_gradient_magnitude(&data, &SHAPE_2D, sigma, window);
        let out = filter::gaussian_gradient_magnitude(&t64.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F64, "gradient magnitude f64");
        let out = filter::gaussian_gradient_magnitude(&t32.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F32, "gradient magnitude f32");

        let expected = reference_laplacian(&data, &SHAPE_2D, sigma, window);
        let out = filter::laplacian_of_gaussian(&t64.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F64, "laplacian f64");
        let out = filter::laplacian_of_gaussian(&t32.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F32, "laplacian f32");

        let k0 = gaussian_kernel_1d(0, sigma, window)?;
        let expected = reference_convolve(&data, &SHAPE_2D, &[&k0, &k0]);
        let out = filter::gaussian_smoothing(&t32.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F32, "smoothing f32");
    }
    Ok(())
}

#[test]
fn scalar_filters_3d_match_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_3D, 4);
    for sigma in SIGMAS_3D {
        let window = WindowPolicy::Ratio(3.5);

        let expected = reference_gradient_magnitude(&data, &SHAPE_3D, sigma, window);
        let out = filter::gaussian_gradient_magnitude(&t64.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F64, "gradient magnitude f64");
        let out = filter::gaussian_gradient_magnitude(&t32.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F32, "gradient magnitude f32");

        let expected = reference_laplacian(&data, &SHAPE_3D, sigma, window);
        let out = filter::laplacian_of_gaussian(&t64.view(), sigma, window)?;
        assert_close(out.as_slice(), &expected, TOL_F64, "laplacian f64");
    }
    Ok(())
}

#[test]
fn hessian_2d_matches_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_2D, 5);
    for sigma in SIGMAS_2D {
        let window = WindowPolicy::Default;
        let components = reference_hessian(&data, &SHAPE_2D, sigma, window);

        let out = filter::hessian_of_gaussian_2d(&t64.view(), sigma, window)?;
        assert_eq!(out.shape, [SHAPE_2D[0], SHAPE_2D[1], 3]);
        for (c, expected) in components.iter().enumerate() {
            assert_close(&component(out.as_slice(), c, 3), expected, TOL_F64, "hessian f64");
        }

        let eigen = reference_eigenvalues(&components);
        let out = filter::hessian_of_gaussian_eigenvalues_2d(&t32.view(), sigma, window)?;
        for c in 0..2 {
            let expected: Vec<f64> = eigen.iter().map(|e| e[c]).collect();
            assert_close(&component_f32(out.as_slice(), c, 2), &expected, TOL_F32, "hessian eigenvalues f32");
        }
    }
    Ok(())
}

#[test]
fn hessian_3d_matches_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_3D, 6);
    for sigma in SIGMAS_3D {
        let window = WindowPolicy::Default;
        let components = reference_hessian(&data, &SHAPE_3D, sigma, window);

        let out = filter::hessian_of_gaussian_3d(&t64.view(), sigma, window)?;
        for (c, expected) in components.iter().enumerate() {
            assert_close(&component(out.as_slice(), c, 6), expected, TOL_F64, "hessian 3-D");
        }

        let eigen = reference_eigenvalues(&components);
        let out64 = filter::hessian_of_gaussian_eigenvalues_3d(&t64.view(), sigma, window)?;
        let out32 = filter::hessian_of_gaussian_eigenvalues_3d(&t32.view(), sigma, window)?;
        assert_eq!(out32.shape, [SHAPE_3D[0], SHAPE_3D[1], SHAPE_3D[2], 3]);
        for c in 0..3 {
            let expected: Vec<f64> = eigen.iter().map(|e| e[c]).collect();
            let what = format!("hessian eigenvalue {c} at sigma {sigma}");
            assert_close(&component(out64.as_slice(), c, 3), &expected, TOL_EIGEN_F64, &what);

            let mae = mean_abs_error(&component_f32(out32.as_slice(), c, 3), &expected);
            assert!(mae <= MAE_HESSIAN_F32, "{what} f32: mean absolute error {mae}");
        }
    }
    Ok(())
}

#[test]
fn structure_tensor_2d_matches_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_2D, 7);
    for (inner, outer) in [(1.0, 2.0), (2.0, 5.0), (5.0, 10.0)] {
        let window = WindowPolicy::Default;
        let components = reference_structure_tensor(&data, &SHAPE_2D, inner, outer, window);

        let out = filter::structure_tensor_2d(&t64.view(), inner, outer, window)?;
        for (c, expected) in components.iter().enumerate() {
            assert_close(&component(out.as_slice(), c, 3), expected, TOL_F64, "structure tensor f64");
        }

        let eigen = reference_eigenvalues(&components);
        let out = filter::structure_tensor_eigenvalues_2d(&t32.view(), inner, outer, window)?;
        for c in 0..2 {
            let expected: Vec<f64> = eigen.iter().map(|e| e[c]).collect();
            assert_close(&component_f32(out.as_slice(), c, 2), &expected, TOL_F32, "structure eigenvalues f32");
        }
    }
    Ok(())
}

#[test]
fn structure_tensor_3d_matches_reference() -> Result<(), FilterError> {
    let (data, t64, t32) = inputs(SHAPE_3D, 8);
    let window = WindowPolicy::Default;
    for (inner, outer) in [(1.0, 5.0), (1.0, 10.0), (5.0, 10.0)] {
        let components = reference_structure_tensor(&data, &SHAPE_3D, inner, outer, window);

        let out = filter::structure_tensor_3d(&t64.view(), inner, outer, window)?;
        assert_eq!(out.shape, [SHAPE_3D[0], SHAPE_3D[1], SHAPE_3D[2], 6]);
        for (c, expected) in components.iter().enumerate() {
            assert_close(&component(out.as_slice(), c, 6), expected, TOL_F64, "structure tensor 3-D");
        }

        let eigen = reference_eigenvalues(&components);
        let out64 = filter::structure_tensor_eigenvalues_3d(&t64.view(), inner, outer, window)?;
        let out32 = filter::structure_tensor_eigenvalues_3d(&t32.view(), inner, outer, window)?;
        for c in 0..3 {
            let expected: Vec<f64> = eigen.iter().map(|e| e[c]).collect();
            let what = format!("structure eigenvalue {c} at scales ({inner}, {outer})");
            assert_close(&component(out64.as_slice(), c, 3), &expected, TOL_EIGEN_F64, &what);

            let mae = mean_abs_error(&component_f32(out32.as_slice(), c, 3), &expected);
            assert!(mae <= MAE_STRUCTURE_F32, "{what} f32: mean absolute error {mae}");
        }
    }

    // ratio window at a small scale pair
    let window = WindowPolicy::Ratio(3.5);
    let components = reference_structure_tensor(&data, &SHAPE_3D, 1.0, 2.5, window);
    let eigen = reference_eigenvalues(&components);
    let out = filter::structure_tensor_eigenvalues_3d(&t64.view(), 1.0, 2.5, window)?;
    for c in 0..3 {
        let expected: Vec<f64> = eigen.iter().map(|e| e[c]).collect();
        assert_close(&component(out.as_slice(), c, 3), &expected, TOL_EIGEN_F64, "structure eigenvalues 3-D");
    }
    Ok(())
}

#[test]
fn gradient_components_match_reference() -> Result<(), FilterError> {
    let (data, t64, _) = inputs(SHAPE_3D, 9);
    let partials = reference_gradient(&data, &SHAPE_3D, 1.5, WindowPolicy::Default);
    let out = filter::gaussian_gradient_3d(&t64.view(), 1.5, WindowPolicy::Default)?;
    for (c, expected) in partials.iter().enumerate() {
        assert_close(&component(out.as_slice(), c, 3), expected, TOL_F64, "gradient 3-D");
    }
    Ok(())
}
