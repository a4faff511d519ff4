use crate::utils::mat::Matrix;

pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    beta1_t: f32,
    beta2_t: f32,
    m: Matrix,
    v: Matrix,
}

impl Adam {
    pub fn new(rows: usize, cols: usize) -> Self {
        let beta1 = 0.9;
        let beta2 = 0.999;
        Adam {
            learning_rate: 0.001,
            beta1,
            beta2,
            epsilon: 1e-8,
            beta1_t: beta1,
            beta2_t: beta2,
            m: Matrix::new(rows, cols),
            v: Matrix::new(rows, cols),
        }
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    pub fn step(&mut self, param: &mut Matrix, grad: &Matrix) {
        self.m = self.m.scale(self.beta1).add(&grad.scale(1.0 - self.beta1));
        self.v = self
            .v
            .scale(self.beta2)
            .add(&grad.mul(grad).scale(1.0 - self.beta2));

        let m_hat = self.m.div_scalar(1.0 - self.beta1_t);
        let v_hat = self.v.div_scalar(1.0 - self.beta2_t);

        let update = m_hat
            .div(&v_hat.sqrt().add_scalar(self.epsilon))
            .scale(self.learning_rate);
        *param = param.sub(&update);

        self.beta1_t *= self.beta1;
        self.beta2_t *= self.beta2;
    }
}
