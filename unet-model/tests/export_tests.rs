mod common;

use common::read_f32;
use rand::Rng;
use unet_model::{DType, Layer, Model, TensorExporter, Weight};

fn quiet() -> TensorExporter {
    TensorExporter::new().with_progress(false)
}

fn row_major_index(index: &[usize], shape: &[usize]) -> usize {
    index.iter().zip(shape).fold(0, |acc, (&i, &d)| acc * d + i)
}

#[test]
fn test_weightless_layer_then_mixed_weights() {
    let w1 = Weight::from_f32("w1", vec![4], &[1.0, 2.0, 3.0, 4.0]).unwrap();
    let w2_values: Vec<f32> = (0..15).map(|v| v as f32).collect();
    let w2 = Weight::from_f32("w2", vec![3, 5], &w2_values).unwrap();
    let model = Model::new(
        "m",
        vec![Layer::new("A", vec![]), Layer::new("B", vec![w1, w2])],
    );

    let out = quiet().export(&model).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].name, "w1");
    assert_eq!(out[0].shape, vec![1, 4, 1, 1]);
    assert_eq!(read_f32(&out[0].data), vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(out[1].name, "w2");
    assert_eq!(out[1].shape, vec![5, 3]);

    let data = read_f32(&out[1].data);
    for i in 0..5 {
        for j in 0..3 {
            assert_eq!(data[i * 3 + j], w2_values[j * 5 + i]);
        }
    }
}

#[test]
fn test_model_without_weights_exports_nothing() {
    let model = Model::new("m", vec![Layer::new("input", vec![]), Layer::new("pool", vec![])]);
    assert!(quiet().export(&model).unwrap().is_empty());
}

#[test]
fn test_vector_index_mapping() {
    let values: Vec<f32> = (0..7).map(|v| v as f32 * 0.5).collect();
    let model = Model::new(
        "m",
        vec![Layer::new("bn", vec![Weight::from_f32("bn/gamma:0", vec![7], &values).unwrap()])],
    );
    let out = quiet().export(&model).unwrap();
    let shape = &out[0].shape;
    assert_eq!(shape, &vec![1, 7, 1, 1]);
    let data = read_f32(&out[0].data);
    // reshaped (0, 0, n, 0) lands at reversed index (0, n, 0, 0)
    for n in 0..7 {
        assert_eq!(data[row_major_index(&[0, n, 0, 0], shape)], values[n]);
    }
}

#[test]
fn test_random_rank4_kernel_is_axis_reversed() {
    let mut rng = rand::thread_rng();
    let shape: Vec<usize> = (0..4).map(|_| rng.gen_range(1..5)).collect();
    let numel: usize = shape.iter().product();
    let values: Vec<f32> = (0..numel).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let model = Model::new(
        "m",
        vec![Layer::new("conv2d", vec![Weight::from_f32("conv2d/kernel:0", shape.clone(), &values).unwrap()])],
    );

    let out = quiet().export(&model).unwrap();
    let reversed: Vec<usize> = shape.iter().rev().copied().collect();
    assert_eq!(out[0].shape, reversed);

    let data = read_f32(&out[0].data);
    for a in 0..reversed[0] {
        for b in 0..reversed[1] {
            for c in 0..reversed[2] {
                for d in 0..reversed[3] {
                    let dst = row_major_index(&[a, b, c, d], &reversed);
                    let src = row_major_index(&[d, c, b, a], &shape);
                    assert_eq!(data[dst], values[src]);
                }
            }
        }
    }
}

#[test]
fn test_scalar_weight_unchanged() {
    let model = Model::new(
        "m",
        vec![Layer::new("s", vec![Weight::from_f32("s/step:0", vec![], &[42.0]).unwrap()])],
    );
    let out = quiet().export(&model).unwrap();
    assert!(out[0].shape.is_empty());
    assert_eq!(read_f32(&out[0].data), vec![42.0]);
}

#[test]
fn test_dtype_is_preserved_for_f16() {
    let values: Vec<half::f16> = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]
        .iter()
        .map(|&v| half::f16::from_f32(v))
        .collect();
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let weight = Weight::new("dense/kernel:0", vec![2, 3], DType::F16, bytes).unwrap();
    let model = Model::new("m", vec![Layer::new("dense", vec![weight])]);

    let out = quiet().export(&model).unwrap();
    assert_eq!(out[0].dtype, DType::F16);
    assert_eq!(out[0].shape, vec![3, 2]);
    let got: Vec<f32> = out[0]
        .data
        .chunks_exact(2)
        .map(|c| half::f16::from_le_bytes([c[0], c[1]]).to_f32())
        .collect();
    assert_eq!(got, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_source_model_is_not_mutated() {
    let model = Model::new(
        "m",
        vec![Layer::new("d", vec![Weight::from_f32("d/k", vec![2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap()])],
    );
    let before = model.clone();
    let _ = quiet().export(&model).unwrap();
    assert_eq!(model, before);
}

#[test]
fn test_export_twice_is_identical() {
    let model = Model::new(
        "m",
        vec![Layer::new("d", vec![Weight::from_f32("d/b", vec![3], &[1.0, 2.0, 3.0]).unwrap()])],
    );
    assert_eq!(quiet().export(&model).unwrap(), quiet().export(&model).unwrap());
}
