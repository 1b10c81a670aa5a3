use lamina_base::{ISA_ENV_VAR, RUNTIME_HW_CONFIG};
use lamina_gemm_f32::{detect_capability, sgemm, IsaVariant, KernelVariant, Transpose};

// Runs in its own process, so the variable is set before the capability token
// is first computed.
#[test]
fn env_forces_baseline() {
    std::env::set_var(ISA_ENV_VAR, "BaseLine");
    assert_eq!(detect_capability(), IsaVariant::Baseline);
    assert_eq!(RUNTIME_HW_CONFIG.active, IsaVariant::Baseline);
    assert!(RUNTIME_HW_CONFIG.detected >= IsaVariant::Baseline);
    assert_eq!(KernelVariant::active().isa, IsaVariant::Baseline);

    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
    let b = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
    let mut c = [0.0; 6];
    sgemm(Transpose::NoTrans, Transpose::NoTrans, 3, 2, 4, 1.0, &a, 4, &b, 2, 0.0, &mut c, 2).unwrap();
    assert_eq!(c, [8.0, 9.0, 20.0, 21.0, 32.0, 33.0]);
}
