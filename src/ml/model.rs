use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{log_softmax, relu},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct MlpConfig {
    #[config(default = 784)]
    pub input_size:  usize,
    #[config(default = 120)]
    pub hidden_1:    usize,
    #[config(default = 84)]
    pub hidden_2:    usize,
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 0.2)]
    pub dropout:     f64,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            fc1:     LinearConfig::new(self.input_size, self.hidden_1).init(device),
            fc2:     LinearConfig::new(self.hidden_1, self.hidden_2).init(device),
            fc3:     LinearConfig::new(self.hidden_2, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Three fully connected layers with ReLU and dropout between them.
/// Dropout is only active on an autodiff backend; `model.valid()`
/// yields the evaluation model where it is the identity.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
    pub fc3:     Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Mlp<B> {
    /// images: [batch, 784] → log-probabilities: [batch, 10]
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dropout.forward(relu(self.fc1.forward(images)));
        let x = self.dropout.forward(relu(self.fc2.forward(x)));
        log_softmax(self.fc3.forward(x), 1)
    }

    pub fn forward_loss(
        &self,
        images:  Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let log_probs = self.forward(images);
        let loss = nll_loss(log_probs.clone(), targets);
        (loss, log_probs)
    }
}

/// Mean negative log-likelihood of the target classes.
/// log_probs: [batch, classes], targets: [batch] → [1]
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [batch_size] = targets.dims();
    let picked = log_probs.gather(1, targets.reshape([batch_size, 1]));
    picked.mean().neg()
}
