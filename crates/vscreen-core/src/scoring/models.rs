//! Fitted regression models, deserialized from scorer files.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Tanh,
    Relu,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Tanh => x.tanh(),
            Self::Relu => x.max(0.0),
            Self::Logistic => 1.0 / (1.0 + (-x).exp()),
            Self::Identity => x,
        }
    }
}

/// Dense layer: `weights[out][in]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub activation: Activation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    fn forward(&self, input: &[f64]) -> f64 {
        let mut values = input.to_vec();
        for layer in &self.layers {
            values = layer
                .weights
                .iter()
                .zip(&layer.biases)
                .map(|(row, bias)| {
                    let z: f64 = row.iter().zip(&values).map(|(w, v)| w * v).sum::<f64>() + bias;
                    layer.activation.apply(z)
                })
                .collect();
        }
        values.first().copied().unwrap_or(0.0)
    }

    fn validate(&self, inputs: usize) -> Result<(), String> {
        let mut width = inputs;
        for (k, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.biases.len() {
                return Err(format!("layer {k} has {} rows but {} biases", layer.weights.len(), layer.biases.len()));
            }
            if layer.weights.iter().any(|row| row.len() != width) {
                return Err(format!("layer {k} rows must have {width} weights"));
            }
            width = layer.weights.len();
        }
        if width != 1 {
            return Err(format!("network must end in a single output, found {width}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().unwrap_or(0.0);
                    index = if v <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Children must point forward so that evaluation terminates.
    fn validate(&self, inputs: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (k, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature, left, right, ..
            } = node
            {
                if *feature >= inputs {
                    return Err(format!("node {k} splits on feature {feature} of {inputs}"));
                }
                if *left <= k || *right <= k || *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(format!("node {k} has invalid children"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Model {
    Linear {
        weights: Vec<f64>,
        intercept: f64,
    },
    RandomForest {
        n_features: usize,
        trees: Vec<Tree>,
    },
    /// Ensemble of feed-forward networks over standardized inputs.
    Mlp {
        networks: Vec<Network>,
        input_mean: Vec<f64>,
        input_scale: Vec<f64>,
    },
}

impl Model {
    pub fn input_width(&self) -> usize {
        match self {
            Self::Linear { weights, .. } => weights.len(),
            Self::RandomForest { n_features, .. } => *n_features,
            Self::Mlp { input_mean, .. } => input_mean.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Linear { .. } => Ok(()),
            Self::RandomForest { n_features, trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".into());
                }
                trees.iter().try_for_each(|t| t.validate(*n_features))
            }
            Self::Mlp {
                networks,
                input_mean,
                input_scale,
            } => {
                if networks.is_empty() {
                    return Err("MLP ensemble has no networks".into());
                }
                if input_mean.len() != input_scale.len() {
                    return Err("input_mean and input_scale differ in length".into());
                }
                networks.iter().try_for_each(|n| n.validate(input_mean.len()))
            }
        }
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        match self {
            Self::Linear { weights, intercept } => {
                weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + intercept
            }
            Self::RandomForest { trees, .. } => {
                trees.iter().map(|t| t.predict(x)).sum::<f64>() / trees.len().max(1) as f64
            }
            Self::Mlp {
                networks,
                input_mean,
                input_scale,
            } => {
                let scaled: Vec<f64> = x
                    .iter()
                    .zip(input_mean.iter().zip(input_scale))
                    .map(|(v, (m, s))| if *s != 0.0 { (v - m) / s } else { v - m })
                    .collect();
                networks.iter().map(|n| n.forward(&scaled)).sum::<f64>() / networks.len().max(1) as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64, low: f64, high: f64) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature: 1,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: low },
                Node::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn linear_model() {
        let m = Model::Linear {
            weights: vec![0.5, -1.0],
            intercept: 2.0,
        };
        assert_eq!(m.input_width(), 2);
        assert_eq!(m.predict(&[4.0, 1.0]), 3.0);
    }

    #[test]
    fn forest_averages_trees() {
        let m = Model::RandomForest {
            n_features: 2,
            trees: vec![stump(1.0, 4.0, 8.0), stump(3.0, 5.0, 7.0)],
        };
        assert!(m.validate().is_ok());
        assert_eq!(m.predict(&[0.0, 2.0]), 6.5);
        assert_eq!(m.predict(&[0.0, 0.5]), 4.5);
    }

    #[test]
    fn forest_rejects_backward_children() {
        let m = Model::RandomForest {
            n_features: 2,
            trees: vec![Tree {
                nodes: vec![Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                }],
            }],
        };
        assert!(m.validate().is_err());
    }

    #[test]
    fn mlp_standardizes_and_averages() {
        let net = |w: f64| Network {
            layers: vec![
                Layer {
                    weights: vec![vec![w, 0.0]],
                    biases: vec![0.0],
                    activation: Activation::Relu,
                },
                Layer {
                    weights: vec![vec![2.0]],
                    biases: vec![1.0],
                    activation: Activation::Identity,
                },
            ],
        };
        let m = Model::Mlp {
            networks: vec![net(1.0), net(3.0)],
            input_mean: vec![1.0, 0.0],
            input_scale: vec![2.0, 1.0],
        };
        assert!(m.validate().is_ok());
        // scaled x0 = (5 - 1) / 2 = 2; outputs 2*2+1 = 5 and 2*6+1 = 13.
        assert_eq!(m.predict(&[5.0, 9.0]), 9.0);
    }

    #[test]
    fn untagged_nodes_deserialize() {
        let tree: Tree = serde_json::from_str(
            r#"{"nodes":[{"feature":0,"threshold":1.5,"left":1,"right":2},{"value":-3.0},{"value":-9.0}]}"#,
        )
        .unwrap();
        assert_eq!(tree.predict(&[2.0]), -9.0);
    }
}
