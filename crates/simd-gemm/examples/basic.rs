//! Basic tour of the checked GEMM entry points.

use simd_gemm::prelude::*;

fn main() -> Result<(), GemmError> {
    println!("SIMD GEMM - Basic Example\n");
    println!("{}\n", simd_gemm::version_info());

    // C = A * B with A 2x3 and B 3x2
    let a = vec![
        1.0f32, 2.0, 3.0, // row 0
        4.0, 5.0, 6.0, // row 1
    ];
    let b = vec![
        7.0f32, 8.0, // row 0
        9.0, 10.0, // row 1
        11.0, 12.0, // row 2
    ];

    println!("Matrix A (2x3):");
    print_matrix(&a, 2, 3);
    println!("\nMatrix B (3x2):");
    print_matrix(&b, 3, 2);

    let c = matmul(&a, 2, 3, &b, 2)?;
    println!("\nC = A * B:");
    print_matrix(&c, 2, 2);

    // Accumulate: C <- 0.5 * A * B + 2 * C
    let mut acc = c.clone();
    Gemm::new(2, 2, 3)
        .alpha(0.5)
        .beta(2.0)
        .execute(&a, 3, &b, 2, &mut acc, 2)?;
    println!("\nC <- 0.5 * A * B + 2 * C:");
    print_matrix(&acc, 2, 2);

    // Same product against B stored transposed (2x3)
    let bt = vec![7.0f32, 9.0, 11.0, 8.0, 10.0, 12.0];
    let mut c_nt = vec![0.0f32; 4];
    sgemm_nt(2, 2, 3, 1.0, &a, 3, &bt, 3, 0.0, &mut c_nt, 2)?;
    println!("\nC = A * (B^T)^T:");
    print_matrix(&c_nt, 2, 2);

    // Reuse one packed B across several A batches
    println!("\n--- Prepacked B ---\n");

    let (m, n, k) = (4, 64, 32);
    let weights: Vec<f32> = (0..k * n).map(|i| ((i % 7) as f32) - 3.0).collect();
    let mut plan = PrepackedPlan::new(m, n, k)?;
    let packed = plan.pack_b(&weights, n)?;
    println!("Plan: {}", plan.fingerprint());
    println!("Packed B: {} floats", packed.len());

    let mut out = vec![0.0f32; m * n];
    for batch in 0..3 {
        let input: Vec<f32> = (0..m * k).map(|i| ((i + batch) % 5) as f32).collect();
        plan.run(&input, &packed, &mut out)?;
        let checksum: f32 = out.iter().sum();
        println!("  batch {batch}: checksum {checksum:.1}");
    }

    // Matrix views
    println!("\n--- Views ---\n");

    let x = Mat::from_fn(3, 3, |i, j| (i * 3 + j) as f32);
    let id = Mat::identity(3);
    let y = x.as_ref().matmul(&id.as_ref())?;
    println!("X * I == X: {}", x == y);

    let corner = x.as_ref().submatrix(1, 1, 2, 2);
    let sq = corner.matmul(&corner)?;
    println!("Lower-right 2x2 squared:");
    print_matrix(sq.as_slice(), 2, 2);

    println!("\nDone!");
    Ok(())
}

fn print_matrix(data: &[f32], rows: usize, cols: usize) {
    for i in 0..rows {
        print!("  ");
        for j in 0..cols {
            print!("{:8.1} ", data[i * cols + j]);
        }
        println!();
    }
}
