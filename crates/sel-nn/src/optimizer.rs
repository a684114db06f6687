use crate::config::OptimizerSpec;
use crate::layers::Param;

impl OptimizerSpec {
    /// Applies one update step to `param` from its stored gradient.
    pub fn step(&self, param: &mut Param) {
        let grads = param.grad.as_slice();
        let values = param.value.as_mut_slice();
        let states = param.state.as_mut_slice();
        match *self {
            OptimizerSpec::RmsProp {
                learning_rate,
                rho,
                epsilon,
            } => {
                for ((value, acc), grad) in values.iter_mut().zip(states.iter_mut()).zip(grads) {
                    *acc = rho * *acc + (1.0 - rho) * grad * grad;
                    *value -= learning_rate * grad / (acc.sqrt() + epsilon);
                }
            }
            OptimizerSpec::Sgd {
                learning_rate,
                momentum,
            } => {
                for ((value, velocity), grad) in values.iter_mut().zip(states.iter_mut()).zip(grads)
                {
                    *velocity = momentum * *velocity - learning_rate * grad;
                    *value += *velocity;
                }
            }
        }
    }
}
