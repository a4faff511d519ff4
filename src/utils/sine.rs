use crate::utils::mat::Matrix;
use crate::utils::nn_trait::Layer;
use std::io::{Read, Write};

pub const DEFAULT_W0: f32 = 30.0;

pub struct SineLayer {
    w0: f32,
    prod_cache: Matrix,
}

impl SineLayer {
    pub fn new(w0: f32) -> Self {
        SineLayer {
            w0,
            prod_cache: Matrix::empty(),
        }
    }
}

impl Layer for SineLayer {
    fn forward(&mut self, input: Matrix) -> Matrix {
        let prod = input.scale(self.w0);
        let mut output = Matrix::new(prod.rows, prod.cols);
        for (dst, z) in output.data.iter_mut().zip(prod.data.iter()) {
            *dst = z.sin();
        }
        self.prod_cache = prod;
        output
    }

    fn backward(&mut self, grad: Matrix) -> Matrix {
        if grad.rows != self.prod_cache.rows || grad.cols != self.prod_cache.cols {
            panic!("call backward with unmatched gradient shape");
        }
        let mut ret = Matrix::new(grad.rows, grad.cols);
        for (dst, (g, z)) in ret
            .data
            .iter_mut()
            .zip(grad.data.iter().zip(self.prod_cache.data.iter()))
        {
            *dst = self.w0 * z.cos() * g;
        }
        ret
    }

    fn infer(&self, input: &Matrix) -> Matrix {
        let mut output = Matrix::new(input.rows, input.cols);
        for (dst, v) in output.data.iter_mut().zip(input.data.iter()) {
            *dst = (self.w0 * v).sin();
        }
        output
    }

    fn load_weights(&mut self, _reader: &mut dyn Read) -> std::io::Result<()> {
        Ok(())
    }

    fn save_weights(&self, _writer: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn set_learning_rate(&mut self, _learning_rate: f32) {}
}
