use glam::Vec3;
use rayon::prelude::*;
use std::fmt::Formatter;

#[derive(Debug, Clone)]
pub struct Matrix {
    pub data: Vec<f32>,
    pub rows: usize,
    pub cols: usize,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn empty() -> Self {
        Matrix {
            data: Vec::new(),
            rows: 0,
            cols: 0,
        }
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Matrix {
            data: vec![v.x, v.y, v.z],
            rows: 1,
            cols: 3,
        }
    }

    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.cols + col] = val;
    }

    fn elementwise<F>(&self, rhs: &Matrix, name: &str, f: F) -> Matrix
    where
        F: Fn(f32, f32) -> f32,
    {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("call {} with unmatched matrix shape", name);
        }
        let mut ret = Matrix::new(self.rows, self.cols);
        for (dst, (a, b)) in ret.data.iter_mut().zip(self.data.iter().zip(rhs.data.iter())) {
            *dst = f(*a, *b);
        }
        ret
    }

    pub fn add(&self, rhs: &Matrix) -> Matrix {
        self.elementwise(rhs, "add", |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Matrix {
        self.elementwise(rhs, "sub", |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Matrix) -> Matrix {
        self.elementwise(rhs, "mul", |a, b| a * b)
    }

    pub fn div(&self, rhs: &Matrix) -> Matrix {
        self.elementwise(rhs, "div", |a, b| a / b)
    }

    fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f32) -> f32,
    {
        let mut ret = Matrix::new(self.rows, self.cols);
        for (dst, src) in ret.data.iter_mut().zip(self.data.iter()) {
            *dst = f(*src);
        }
        ret
    }

    pub fn scale(&self, val: f32) -> Matrix {
        self.map(|a| a * val)
    }

    pub fn add_scalar(&self, val: f32) -> Matrix {
        self.map(|a| a + val)
    }

    pub fn div_scalar(&self, val: f32) -> Matrix {
        self.map(|a| a / val)
    }

    pub fn abs(&self) -> Matrix {
        self.map(f32::abs)
    }

    pub fn sqrt(&self) -> Matrix {
        self.map(f32::sqrt)
    }

    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("call matmul with unmatched matrix shape");
        }
        let mut ret = Matrix::new(self.rows, rhs.cols);
        let cols = rhs.cols;
        ret.data
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(i, out_row)| {
                for k in 0..self.cols {
                    let a = self.data[i * self.cols + k];
                    let rhs_row = &rhs.data[k * cols..(k + 1) * cols];
                    for (dst, b) in out_row.iter_mut().zip(rhs_row.iter()) {
                        *dst += a * b;
                    }
                }
            });
        ret
    }

    pub fn transpose(&self) -> Matrix {
        let mut ret = Matrix::new(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                ret.set(j, i, self.at(i, j));
            }
        }
        ret
    }

    // per-row broadcast of a (1, cols) bias row, the only broadcast supported
    pub fn add_row_assign(&mut self, row: &Matrix) {
        if row.rows != 1 || self.cols != row.cols {
            panic!("call add_row_assign with unmatched matrix shape");
        }
        for chunk in self.data.chunks_mut(self.cols) {
            for (dst, b) in chunk.iter_mut().zip(row.data.iter()) {
                *dst += b;
            }
        }
    }

    pub fn sum(&self) -> Matrix {
        let mut ret = Matrix::new(1, 1);
        ret.data[0] = self.data.iter().sum();
        ret
    }

    pub fn max(&self) -> f32 {
        self.data
            .iter()
            .copied()
            .fold(self.data[0], |a, b| if b > a { b } else { a })
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                f.write_fmt(format_args!("{:.4}", self.at(i, j)))?;
                if j + 1 == self.cols {
                    f.write_str("\n")?;
                } else {
                    f.write_str(" ")?;
                }
            }
        }
        Ok(())
    }
}
