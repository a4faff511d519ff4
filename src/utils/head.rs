use crate::utils::mat::Matrix;

pub struct Mse {
    diff: Matrix,
}

impl Mse {
    pub fn new() -> Self {
        Mse {
            diff: Matrix::empty(),
        }
    }

    pub fn forward(&mut self, predictions: &Matrix, targets: &Matrix) -> Matrix {
        if predictions.rows != targets.rows || predictions.cols != targets.cols {
            panic!("call mse forward with unmatched matrix shape");
        }
        let diff = predictions.sub(targets);
        let n = diff.data.len() as f32;
        let loss = diff.mul(&diff).sum().div_scalar(n);
        self.diff = diff;
        loss
    }

    // 2/N over the total element count, not the row count
    pub fn backward(&self) -> Matrix {
        let n = self.diff.data.len() as f32;
        self.diff.scale(2.0 / n)
    }
}
