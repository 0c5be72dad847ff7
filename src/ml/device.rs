// Backend selection. The requested DeviceChoice is resolved once
// at startup into a ComputeDevice; everything below TrainUseCase
// is generic over the matching AutodiffBackend.
//
//   Auto        → probe for a wgpu adapter, fall back to CPU
//   Accelerator → probe, and fail if no adapter exists
//   Cpu         → ndarray, no probe

use std::panic;

use burn::backend::{wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::TrainError;

pub type AcceleratorBackend = Autodiff<Wgpu>;
pub type CpuBackend = Autodiff<NdArray>;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceChoice {
    #[default]
    Auto,
    Accelerator,
    Cpu,
}

/// What the run actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Accelerator,
    Cpu,
}

impl ComputeDevice {
    pub fn describe(self) -> &'static str {
        match self {
            ComputeDevice::Accelerator => "accelerator backend in use (wgpu)",
            ComputeDevice::Cpu => "running on CPU (ndarray)",
        }
    }
}

/// Resolve `choice` against `accelerator_available`, which is only called
/// when the choice needs it.
pub fn resolve_device(
    choice: DeviceChoice,
    accelerator_available: impl FnOnce() -> bool,
) -> Result<ComputeDevice, TrainError> {
    match choice {
        DeviceChoice::Cpu => Ok(ComputeDevice::Cpu),
        DeviceChoice::Auto => Ok(if accelerator_available() {
            ComputeDevice::Accelerator
        } else {
            ComputeDevice::Cpu
        }),
        DeviceChoice::Accelerator => {
            if accelerator_available() {
                Ok(ComputeDevice::Accelerator)
            } else {
                Err(TrainError::Configuration(
                    "backend wgpu was requested but no GPU adapter is available".into(),
                ))
            }
        }
    }
}

/// Start the wgpu runtime on the default device and run one tiny
/// round-trip. Burn panics when no adapter can be found, so the panic is
/// caught here and reported as "not available".
pub fn wgpu_adapter_available() -> bool {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));

    let available = panic::catch_unwind(|| {
        let device = WgpuDevice::default();
        let _ = Tensor::<Wgpu, 1>::zeros([1], &device).into_data();
        true
    })
    .unwrap_or(false);

    panic::set_hook(previous_hook);
    tracing::debug!("wgpu adapter available: {}", available);
    available
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn auto_follows_the_probe() {
        assert_eq!(resolve_device(DeviceChoice::Auto, || true).unwrap(), ComputeDevice::Accelerator);
        assert_eq!(resolve_device(DeviceChoice::Auto, || false).unwrap(), ComputeDevice::Cpu);
    }

    #[test]
    fn explicit_accelerator_without_adapter_is_a_configuration_error() {
        assert_eq!(
            resolve_device(DeviceChoice::Accelerator, || true).unwrap(),
            ComputeDevice::Accelerator
        );
        let err = resolve_device(DeviceChoice::Accelerator, || false).unwrap_err();
        assert!(matches!(err, TrainError::Configuration(_)));
    }

    #[test]
    fn cpu_never_probes() {
        let probed = Cell::new(false);
        let device = resolve_device(DeviceChoice::Cpu, || {
            probed.set(true);
            true
        })
        .unwrap();

        assert_eq!(device, ComputeDevice::Cpu);
        assert!(!probed.get());
    }

    #[test]
    fn choice_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&DeviceChoice::Auto).unwrap(), "\"auto\"");
        assert_eq!(serde_json::to_string(&DeviceChoice::Cpu).unwrap(), "\"cpu\"");
        assert_eq!(
            serde_json::to_string(&DeviceChoice::Accelerator).unwrap(),
            "\"accelerator\""
        );
        assert_eq!(DeviceChoice::default(), DeviceChoice::Auto);
    }
}
