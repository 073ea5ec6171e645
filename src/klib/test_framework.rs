//! Framework de testes do kernel
//!
//! Suítes rodadas no boot quando a feature `self_test` está ativa. Cada
//! subsistema expõe um `&[TestCase]` no seu `test.rs`.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    crate::kinfo!("=== Executando suite: " => name);

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        let result = (test.func)();
        match result {
            TestResult::Passed => {
                crate::kinfo!("[PASS] " => test.name);
                passed += 1;
            }
            TestResult::Failed => {
                crate::kerror!("[FAIL] " => test.name);
                failed += 1;
            }
            TestResult::Skipped => {
                crate::kwarn!("[SKIP] " => test.name);
                skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", passed);
    (passed, failed, skipped)
}

/// Converte uma condição em `TestResult`, registrando a falha.
pub fn check(cond: bool, what: &'static str) -> TestResult {
    if cond {
        TestResult::Passed
    } else {
        crate::kerror!("(Test) condição falhou: " => what);
        TestResult::Failed
    }
}
