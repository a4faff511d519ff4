use crate::utils::mat::Matrix;
use crate::utils::misc::{read_f32, write_f32};
use crate::utils::nn_trait::Layer;
use crate::utils::optimizer::Adam;
use std::io::{Read, Write};

pub struct DenseLayer {
    pub weights: Matrix,
    pub biases: Matrix,
    weight_opt: Adam,
    bias_opt: Adam,
    input_cache: Matrix,
}

impl DenseLayer {
    pub fn new(input_size: usize, output_size: usize) -> Self {
        DenseLayer {
            weights: Matrix::new(output_size, input_size),
            biases: Matrix::new(1, output_size),
            weight_opt: Adam::new(output_size, input_size),
            bias_opt: Adam::new(1, output_size),
            input_cache: Matrix::empty(),
        }
    }
}

impl Layer for DenseLayer {
    fn forward(&mut self, input: Matrix) -> Matrix {
        let mut output = input.matmul(&self.weights.transpose());
        output.add_row_assign(&self.biases);
        self.input_cache = input;
        output
    }

    fn backward(&mut self, grad: Matrix) -> Matrix {
        let d_weights = grad.transpose().matmul(&self.input_cache);
        let mut d_biases = Matrix::new(1, self.biases.cols);
        for j in 0..grad.cols {
            let mut sum = 0.0;
            for i in 0..grad.rows {
                sum += grad.at(i, j);
            }
            d_biases.set(0, j, sum);
        }

        self.weight_opt.step(&mut self.weights, &d_weights);
        self.bias_opt.step(&mut self.biases, &d_biases);

        // the input gradient uses the weights as updated just above
        grad.matmul(&self.weights)
    }

    fn infer(&self, input: &Matrix) -> Matrix {
        let mut output = input.matmul(&self.weights.transpose());
        output.add_row_assign(&self.biases);
        output
    }

    fn load_weights(&mut self, reader: &mut dyn Read) -> std::io::Result<()> {
        for val in self.weights.data.iter_mut() {
            *val = read_f32(reader)?;
        }
        for val in self.biases.data.iter_mut() {
            *val = read_f32(reader)?;
        }
        Ok(())
    }

    fn save_weights(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        for val in self.weights.data.iter() {
            write_f32(writer, *val)?;
        }
        for val in self.biases.data.iter() {
            write_f32(writer, *val)?;
        }
        Ok(())
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.weight_opt.set_learning_rate(learning_rate);
        self.bias_opt.set_learning_rate(learning_rate);
    }
}
