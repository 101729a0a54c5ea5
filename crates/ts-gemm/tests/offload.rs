// End-to-end multiplications on the simulated accelerator, checked
// against the host reference.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ts_device::DeviceConfig;
use ts_gemm::{
    compare, Accelerator, CpuBackend, GemmBackend, GemmError, Limits, MatrixMut, MatrixRef, Session,
    SimAccelerator,
};

/// Small integers keep every product and partial sum exact in f64.
fn random_matrix(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-8..=8) as f64).collect()
}

fn open(tile: usize, limits: Limits) -> Session<SimAccelerator> {
    let config = DeviceConfig::new(tile, 150, 16).unwrap();
    Session::open(SimAccelerator::with_config(config), limits).unwrap()
}

struct Problem {
    m: usize,
    n: usize,
    k: usize,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
}

impl Problem {
    fn random(rng: &mut StdRng, m: usize, n: usize, k: usize) -> Self {
        Problem {
            m,
            n,
            k,
            a: random_matrix(rng, m * k),
            b: random_matrix(rng, k * n),
            c: random_matrix(rng, m * n),
        }
    }

    fn run(&self, backend: &mut dyn GemmBackend, alpha: f64, beta: f64) -> Result<Vec<f64>, GemmError> {
        let mut c = self.c.clone();
        backend.gemm(
            alpha,
            MatrixRef::contiguous(&self.a, self.m, self.k)?,
            MatrixRef::contiguous(&self.b, self.k, self.n)?,
            beta,
            MatrixMut::contiguous(&mut c, self.m, self.n)?,
        )?;
        Ok(c)
    }

    fn check(&self, session: &mut Session<SimAccelerator>, alpha: f64, beta: f64) {
        let expected = self.run(&mut CpuBackend::new(), alpha, beta).unwrap();
        let actual = self.run(session, alpha, beta).unwrap();
        let e = MatrixRef::contiguous(&expected, self.m, self.n).unwrap();
        let a = MatrixRef::contiguous(&actual, self.m, self.n).unwrap();
        if let Some(mismatch) = compare(&e, &a).unwrap() {
            panic!("{}x{}x{}: {}", self.m, self.n, self.k, mismatch);
        }
    }
}

#[test]
fn test_random_sizes_match_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut session = open(16, Limits::new(64, 64, 64));
    for _ in 0..12 {
        let m = rng.gen_range(1..=64);
        let n = rng.gen_range(1..=64);
        let k = rng.gen_range(1..=64);
        Problem::random(&mut rng, m, n, k).check(&mut session, 1.0, 0.0);
    }
    assert_eq!(session.device().outstanding_runs(), 0);
}

#[test]
fn test_single_element() {
    let mut session = open(16, Limits::new(1, 1, 1));
    let mut c = vec![0.0];
    session
        .multiply(
            1.0,
            MatrixRef::contiguous(&[3.0], 1, 1).unwrap(),
            MatrixRef::contiguous(&[4.0], 1, 1).unwrap(),
            0.0,
            MatrixMut::contiguous(&mut c, 1, 1).unwrap(),
        )
        .unwrap();
    assert_eq!(c, vec![12.0]);
}

#[test]
fn test_exactly_one_tile() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut session = open(16, Limits::new(16, 16, 16));
    Problem::random(&mut rng, 16, 16, 16).check(&mut session, 1.0, 0.0);
    // one input run and one output run
    assert_eq!(session.device().stats().dispatches, 2);
}

#[test]
fn test_ragged_edges_write_only_in_bounds() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut session = open(16, Limits::new(20, 18, 17));
    let p = Problem::random(&mut rng, 20, 18, 17);
    p.check(&mut session, 1.0, 0.0);

    // C sits inside a larger buffer; nothing past its 360 elements changes
    let mut buffer = vec![-1.0; 20 * 18 + 32];
    session
        .multiply(
            1.0,
            MatrixRef::contiguous(&p.a, 20, 17).unwrap(),
            MatrixRef::contiguous(&p.b, 17, 18).unwrap(),
            0.0,
            MatrixMut::contiguous(&mut buffer[..360], 20, 18).unwrap(),
        )
        .unwrap();
    assert!(buffer[360..].iter().all(|&v| v == -1.0));
}

#[test]
fn test_repeated_call_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(19);
    let mut session = open(16, Limits::new(40, 40, 40));
    let p = Problem::random(&mut rng, 33, 29, 40);
    let first = p.run(&mut session, 2.0, 0.5).unwrap();
    let second = p.run(&mut session, 2.0, 0.5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_result_independent_of_tile_size() {
    let mut rng = StdRng::seed_from_u64(23);
    let p = Problem::random(&mut rng, 13, 22, 9);
    let small = p.run(&mut open(4, Limits::new(32, 32, 32)), 1.0, 1.0).unwrap();
    let large = p.run(&mut open(16, Limits::new(32, 32, 32)), 1.0, 1.0).unwrap();
    assert_eq!(small, large);
}

#[test]
fn test_consecutive_sizes_do_not_leak_state() {
    let mut rng = StdRng::seed_from_u64(29);
    let mut session = open(8, Limits::new(40, 40, 40));
    for (m, n, k) in [(20, 18, 17), (3, 5, 2), (40, 40, 40), (1, 33, 7), (20, 18, 17)] {
        Problem::random(&mut rng, m, n, k).check(&mut session, 1.0, 0.0);
        assert_eq!(session.device().buffered_output(), 0);
    }
}

#[test]
fn test_alpha_and_beta() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut session = open(8, Limits::new(24, 24, 24));
    let p = Problem::random(&mut rng, 17, 11, 24);
    for (alpha, beta) in [(1.0, 0.0), (-2.0, 0.0), (1.0, 1.0), (0.5, -3.0), (0.0, 2.0)] {
        p.check(&mut session, alpha, beta);
    }
}

#[test]
fn test_strided_operands() {
    let mut rng = StdRng::seed_from_u64(37);
    let (m, n, k) = (9, 7, 10);
    let (lda, ldb, ldc) = (13, 8, 12);
    let a = random_matrix(&mut rng, (m - 1) * lda + k);
    let b = random_matrix(&mut rng, (k - 1) * ldb + n);
    let c0 = random_matrix(&mut rng, (m - 1) * ldc + n);

    let mut expected = c0.clone();
    CpuBackend::new()
        .gemm(
            1.0,
            MatrixRef::new(&a, m, k, lda).unwrap(),
            MatrixRef::new(&b, k, n, ldb).unwrap(),
            1.0,
            MatrixMut::new(&mut expected, m, n, ldc).unwrap(),
        )
        .unwrap();

    let mut actual = c0.clone();
    let mut session = open(4, Limits::new(16, 16, 16));
    session
        .multiply(
            1.0,
            MatrixRef::new(&a, m, k, lda).unwrap(),
            MatrixRef::new(&b, k, n, ldb).unwrap(),
            1.0,
            MatrixMut::new(&mut actual, m, n, ldc).unwrap(),
        )
        .unwrap();

    // padding between C rows is untouched
    assert_eq!(actual, expected);
    for row in 0..m - 1 {
        assert_eq!(actual[row * ldc + n..(row + 1) * ldc], c0[row * ldc + n..(row + 1) * ldc]);
    }
}

#[test]
fn test_device_fault_is_an_error_not_a_mismatch() {
    let mut rng = StdRng::seed_from_u64(41);
    let p = Problem::random(&mut rng, 32, 32, 16);

    let mut dev = SimAccelerator::with_config(DeviceConfig::new(16, 150, 16).unwrap());
    dev.fail_wait_at(3);
    let mut session = Session::open(dev, Limits::new(32, 32, 32)).unwrap();

    let err = p.run(&mut session, 1.0, 0.0).unwrap_err();
    assert!(err.is_device());
    assert_eq!(session.device().outstanding_runs(), 0);

    // the same problem on a healthy device verifies cleanly
    p.check(&mut open(16, Limits::new(32, 32, 32)), 1.0, 0.0);
}

#[test]
fn test_retry_on_failed_session_is_refused() {
    let mut rng = StdRng::seed_from_u64(43);
    let p = Problem::random(&mut rng, 32, 32, 16);

    let mut dev = SimAccelerator::with_config(DeviceConfig::new(16, 150, 16).unwrap());
    dev.fail_wait_at(2);
    let mut session = Session::open(dev, Limits::new(32, 32, 32)).unwrap();
    assert!(p.run(&mut session, 1.0, 0.0).unwrap_err().is_device());

    // leftover result tiles must never surface as a successful result
    for _ in 0..2 {
        assert!(matches!(p.run(&mut session, 1.0, 0.0), Err(GemmError::Poisoned)));
    }

    // closing hands back the device with its stale output; a new device
    // of the same build starts from a clean stream
    let dev = session.close();
    assert!(dev.buffered_output() > 0);
    let config = dev.config().clone();
    let mut fresh = Session::open(SimAccelerator::with_config(config), Limits::new(32, 32, 32)).unwrap();
    p.check(&mut fresh, 1.0, 0.0);
}

#[test]
fn test_estimate_tracks_padding() {
    let session = open(16, Limits::new(64, 64, 64));
    let exact = session.estimate(32, 32, 32).unwrap();
    let ragged = session.estimate(33, 32, 32).unwrap();
    assert_eq!(exact.ticks, 2 * 2 * 2 * 256);
    assert_eq!(ragged.ticks, 3 * 2 * 2 * 256);
    assert!(ragged.efficiency < exact.efficiency);
}
