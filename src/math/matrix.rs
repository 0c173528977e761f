use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::{Add, Sub};

/// Dense row-major matrix of `f64`.
///
/// Every binary operation checks shapes and panics on a mismatch; callers are
/// expected to hand in consistent operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map_or(0, |row| row.len());
        assert!(
            data.iter().all(|row| row.len() == cols),
            "Matrix rows must all have the same length"
        );
        Matrix {
            rows: data.len(),
            cols,
            data
        }
    }

    /// Samples from N(0, std_dev²).
    ///
    /// Small `std_dev` (e.g. 1e-4) gives the near-zero weights a freshly
    /// initialized linear classifier starts from, where the loss should sit
    /// close to ln(num_classes).
    pub fn gaussian<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for v in row.iter_mut() {
                *v = sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, rhs.rows,
            "Matrices are of incorrect sizes for product: {}x{} · {}x{}",
            self.rows, self.cols, rhs.rows, rhs.cols
        );

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order keeps the inner loop on contiguous rows of `rhs` and `res`.
        for (lhs_row, out_row) in self.data.iter().zip(res.data.iter_mut()) {
            for (&a, rhs_row) in lhs_row.iter().zip(rhs.data.iter()) {
                for (out, &b) in out_row.iter_mut().zip(rhs_row.iter()) {
                    *out += a * b;
                }
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect()
        }
    }

    pub fn scale(&self, k: f64) -> Matrix {
        self.map(|x| x * k)
    }

    /// Maximum of each row. A row with no columns yields `-inf`.
    pub fn row_max(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }

    pub fn row_sum(&self) -> Vec<f64> {
        self.data.iter().map(|row| row.iter().sum()).collect()
    }

    /// Subtracts `v[i]` from every entry of row `i`.
    pub fn sub_per_row(&self, v: &[f64]) -> Matrix {
        self.per_row(v, |x, r| x - r)
    }

    /// Divides every entry of row `i` by `v[i]`.
    pub fn div_per_row(&self, v: &[f64]) -> Matrix {
        self.per_row(v, |x, r| x / r)
    }

    fn per_row<F>(&self, v: &[f64], op: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(v.len(), self.rows, "Row broadcast needs one value per row");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .zip(v.iter())
                .map(|(row, &r)| row.iter().map(|&x| op(x, r)).collect())
                .collect()
        }
    }

    /// Picks `data[i][cols[i]]` for every row `i`.
    pub fn gather(&self, cols: &[usize]) -> Vec<f64> {
        assert_eq!(cols.len(), self.rows, "gather needs one column index per row");
        self.data
            .iter()
            .zip(cols.iter())
            .map(|(row, &c)| row[c])
            .collect()
    }

    /// Adds `delta` to `data[i][cols[i]]` for every row `i`.
    pub fn add_at(&mut self, cols: &[usize], delta: f64) {
        assert_eq!(cols.len(), self.rows, "add_at needs one column index per row");
        for (row, &c) in self.data.iter_mut().zip(cols.iter()) {
            row[c] += delta;
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.sum_squares().sqrt()
    }

    pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
        self.assert_same_shape(other);
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Serializes the matrix to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Deserializes a matrix from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<Matrix> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let m: Matrix = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if m.data.len() != m.rows || m.data.iter().any(|row| row.len() != m.cols) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("matrix data does not match declared shape {}x{}", m.rows, m.cols),
            ));
        }
        Ok(m)
    }

    fn assert_same_shape(&self, other: &Matrix) {
        if self.rows != other.rows || self.cols != other.cols {
            panic!(
                "Matrices are of incorrect sizes: {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )
        }
    }

    fn zip_with<F>(&self, other: &Matrix, op: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        self.assert_same_shape(other);
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| op(x, y)).collect())
                .collect()
        }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Uniform on (0, 1] so ln() never sees 0.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a + b)
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a - b)
    }
}
