//! Brings the interpreter up far enough to put the machine into S5.

use alloc::collections::VecDeque;
use core::fmt;

use log::{debug, error, info, warn};

use crate::{
    interpreter::{InitFlags, Interpreter, SleepState},
    Options, OsServices, Osl, Platform, Status,
};

/// Initial size of the interpreter's table list.
pub const INITIAL_TABLE_COUNT: u32 = 16;

/// One interpreter entry point of the power-off sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    InitializeSubsystem,
    InitializeTables,
    LoadTables,
    EnableSubsystem,
    InitializeObjects,
    EnterSleepStatePrep,
    EnterSleepState,
}

impl Step {
    pub const SEQUENCE: [Step; 7] = [
        Step::InitializeSubsystem,
        Step::InitializeTables,
        Step::LoadTables,
        Step::EnableSubsystem,
        Step::InitializeObjects,
        Step::EnterSleepStatePrep,
        Step::EnterSleepState,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::InitializeSubsystem => "initialize subsystem",
            Step::InitializeTables => "initialize tables",
            Step::LoadTables => "load tables",
            Step::EnableSubsystem => "enable subsystem",
            Step::InitializeObjects => "initialize objects",
            Step::EnterSleepStatePrep => "enter sleep state prep",
            Step::EnterSleepState => "enter sleep state",
        }
    }

    /// Where the driver stands once this step succeeded.
    fn reached(self) -> State {
        match self {
            Step::InitializeSubsystem => State::SubsystemInitialized,
            Step::InitializeTables => State::TablesInitialized,
            Step::LoadTables => State::TablesLoaded,
            Step::EnableSubsystem => State::SubsystemEnabled,
            Step::InitializeObjects => State::ObjectsInitialized,
            Step::EnterSleepStatePrep => State::SleepPrepared,
            Step::EnterSleepState => State::Asleep,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    SubsystemInitialized,
    TablesInitialized,
    TablesLoaded,
    SubsystemEnabled,
    ObjectsInitialized,
    SleepPrepared,
    /// The machine should be off; reaching this on return means it is not.
    Asleep,
    Failed(Step),
    Terminated,
}

/// What the driver is run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    PowerOff,
    /// Power off, or with `dump_namespace` list the namespace instead.
    Diagnostic(Options),
}

impl Mode {
    fn last_step(&self) -> Step {
        match self {
            Mode::Diagnostic(options) if options.dump_namespace => Step::InitializeObjects,
            _ => Step::EnterSleepState,
        }
    }
}

pub struct Driver<P, I> {
    osl: Osl<P>,
    interpreter: I,
    state: State,
}

impl<P: Platform, I: Interpreter> Driver<P, I> {
    pub fn new(platform: P, interpreter: I) -> Self {
        Self {
            osl: Osl::new(platform),
            interpreter,
            state: State::Uninitialized,
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn osl(&self) -> &Osl<P> {
        &self.osl
    }

    #[inline]
    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    /// Run the whole sequence and return the exit status: 0 on success,
    /// the failing exception code when powering off, -1 for a failed
    /// diagnostic run.
    pub fn run(&mut self, mode: &Mode) -> i32 {
        if let Mode::Diagnostic(options) = mode {
            self.interpreter.set_debug(options.level, options.layers);
        }

        let last = mode.last_step();
        for step in Step::SEQUENCE {
            if let Err(status) = self.advance(step) {
                return self.fail(mode, step, status);
            }
            if step == last {
                break;
            }
        }

        let mut code = 0;
        match mode {
            Mode::Diagnostic(options) if options.dump_namespace => match self.dump_namespace() {
                Ok(count) => info!("acpioff: dumped {} namespace node(s)", count),
                Err(status) => {
                    error!("acpioff: namespace dump failed: {}", status);
                    code = -1;
                }
            },
            _ => warn!("acpioff: still running after entering S5"),
        }

        self.teardown();
        code
    }

    /// Call the interpreter entry point for `step`, then run the work it
    /// deferred and pick up the SCI line it may have learnt about.
    pub fn advance(&mut self, step: Step) -> Result<(), Status> {
        debug!("acpioff: {}", step);

        let os: &mut dyn OsServices = &mut self.osl;
        let result = match step {
            Step::InitializeSubsystem => self.interpreter.initialize_subsystem(os),
            Step::InitializeTables => {
                self.interpreter
                    .initialize_tables(os, INITIAL_TABLE_COUNT, false)
            }
            Step::LoadTables => self.interpreter.load_tables(os),
            Step::EnableSubsystem => self
                .interpreter
                .enable_subsystem(os, InitFlags::FULL_INITIALIZATION),
            Step::InitializeObjects => self
                .interpreter
                .initialize_objects(os, InitFlags::FULL_INITIALIZATION),
            Step::EnterSleepStatePrep => self
                .interpreter
                .enter_sleep_state_prep(os, SleepState::S5),
            Step::EnterSleepState => self.interpreter.enter_sleep_state(os, SleepState::S5),
        };

        self.osl.process_deferred_work(false);
        self.osl.set_sci_interrupt(self.interpreter.sci_interrupt());

        match result {
            Ok(()) => {
                self.state = step.reached();
                Ok(())
            }
            Err(status) => {
                self.state = State::Failed(step);
                Err(status)
            }
        }
    }

    /// Print the full path of every namespace node, breadth first, each on
    /// its own indented line. Returns the number of nodes printed.
    pub fn dump_namespace(&mut self) -> Result<usize, Status> {
        let result = self.walk_namespace();
        self.osl.process_deferred_work(false);
        result
    }

    fn walk_namespace(&mut self) -> Result<usize, Status> {
        let mut pending = VecDeque::new();
        pending.push_back(self.interpreter.root());

        let mut count = 0;
        while let Some(node) = pending.pop_front() {
            let path = self.interpreter.full_path(&mut self.osl, node)?;
            self.osl.printf(format_args!("    {}\n", path));
            count += 1;

            let mut previous = None;
            while let Some(child) = self.interpreter.next_child(&mut self.osl, node, previous)? {
                pending.push_back(child);
                previous = Some(child);
            }
        }
        Ok(count)
    }

    fn fail(&mut self, mode: &Mode, step: Step, status: Status) -> i32 {
        let text = self.interpreter.format_exception(status);
        error!("acpioff: {} failed: {}", step, text);

        let code = match mode {
            Mode::PowerOff => status.exit_code(),
            Mode::Diagnostic(_) => {
                // Whatever made it into the namespace may explain the failure.
                if let Err(dump) = self.dump_namespace() {
                    warn!("acpioff: namespace dump failed: {}", dump);
                }
                -1
            }
        };

        self.osl
            .printf(format_args!("acpioff: {} failed: {}\n", step, text));
        self.teardown();
        code
    }

    /// Shut the interpreter down and discard whatever it left queued.
    pub fn teardown(&mut self) {
        if let Err(status) = self.interpreter.terminate(&mut self.osl) {
            warn!("acpioff: terminate failed: {}", status);
        }
        // Also covers interpreters that do not call back on terminate.
        if let Err(error) = self.osl.terminate() {
            warn!("acpioff: services layer terminate failed: {}", error);
        }
        if !matches!(self.state, State::Failed(_)) {
            self.state = State::Terminated;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use super::*;
    use crate::{
        memory::Width,
        mock::{MockInterpreter, MockPlatform, MOCK_PM1A_CONTROL, MOCK_SCI},
        options::{DebugLayer, DebugLevel},
    };

    const ALL_STEPS: [&str; 7] = [
        "initialize_subsystem",
        "initialize_tables",
        "load_tables",
        "enable_subsystem",
        "initialize_objects",
        "enter_sleep_state_prep",
        "enter_sleep_state",
    ];

    fn platform() -> MockPlatform {
        let mut platform = MockPlatform::new();
        platform.set_root_pointer(0x000f_6a20);
        platform
    }

    fn driver(interpreter: MockInterpreter) -> Driver<MockPlatform, MockInterpreter> {
        Driver::new(platform(), interpreter)
    }

    fn dump_options() -> Mode {
        Mode::Diagnostic(Options {
            dump_namespace: true,
            ..Options::default()
        })
    }

    #[test]
    fn powers_off() {
        let mut driver = driver(MockInterpreter::new());
        assert_eq!(driver.run(&Mode::PowerOff), 0);

        let mut calls: Vec<&str> = ALL_STEPS.to_vec();
        calls.push("terminate");
        assert_eq!(driver.interpreter().calls(), calls);
        assert_eq!(driver.state(), State::Terminated);

        // S5 with SLP_EN set.
        assert_eq!(
            driver.osl().platform().port_writes(),
            [(MOCK_PM1A_CONTROL, 0x3400, Width::Word)]
        );
        assert!(driver.osl().platform().console_text().is_empty());
    }

    #[test]
    fn deferred_work_runs_between_steps() {
        let mut driver = driver(MockInterpreter::new());
        driver.run(&Mode::PowerOff);

        // Two items queued while enabling, one while initialising objects
        // and one in prep, each drained before the next entry point.
        assert_eq!(driver.interpreter().ran_at_entry(), [0, 0, 0, 0, 2, 3, 4, 4]);
        // The one queued during terminate never runs.
        assert_eq!(driver.interpreter().ran(), 4);
        assert_eq!(driver.osl().pending_work(), 0);
    }

    #[test]
    fn failing_step_reports_and_returns_its_code() {
        let mut driver = driver(MockInterpreter::failing(
            Step::LoadTables,
            Status::AE_NO_ACPI_TABLES,
        ));
        assert_eq!(driver.run(&Mode::PowerOff), 2);

        assert_eq!(
            driver.interpreter().calls(),
            ["initialize_subsystem", "initialize_tables", "load_tables", "terminate"]
        );
        assert_eq!(driver.state(), State::Failed(Step::LoadTables));
        assert_eq!(
            driver.osl().platform().console_text(),
            "acpioff: load tables failed: AE_NO_ACPI_TABLES\n"
        );
        assert!(driver.osl().platform().port_writes().is_empty());
    }

    #[test]
    fn missing_root_pointer_fails_table_initialization() {
        let mut driver = Driver::new(MockPlatform::new(), MockInterpreter::new());
        let code = driver.run(&Mode::PowerOff);

        assert_eq!(code, Status::AE_NOT_FOUND.exit_code());
        assert_eq!(
            driver.osl().platform().console_text(),
            "acpioff: initialize tables failed: AE_NOT_FOUND\n"
        );
    }

    #[test]
    fn unknown_exception_text() {
        let mut driver = driver(MockInterpreter::failing(
            Step::EnterSleepState,
            Status(0x0fff),
        ));
        assert_eq!(driver.run(&Mode::PowerOff), 0x0fff);
        assert_eq!(
            driver.osl().platform().console_text(),
            "acpioff: enter sleep state failed: UNKNOWN_STATUS_CODE\n"
        );
    }

    #[test]
    fn sci_line_is_learnt_from_the_tables() {
        let mut driver = driver(MockInterpreter::new());

        driver.advance(Step::InitializeSubsystem).unwrap();
        assert_eq!(driver.osl().irq().sci(), None);

        driver.advance(Step::InitializeTables).unwrap();
        assert_eq!(driver.osl().irq().sci(), Some(MOCK_SCI));

        driver.advance(Step::LoadTables).unwrap();
        driver.advance(Step::EnableSubsystem).unwrap();
        assert_eq!(driver.state(), State::SubsystemEnabled);
        assert_eq!(
            driver.osl().irq().registration().map(|r| r.irq),
            Some(MOCK_SCI)
        );

        driver.teardown();
        assert!(driver.osl().irq().registration().is_none());
    }

    #[test]
    fn diagnostic_dump_instead_of_power_off() {
        let mut driver = driver(MockInterpreter::new());
        assert_eq!(driver.run(&dump_options()), 0);

        assert_eq!(
            driver.interpreter().calls(),
            [
                "initialize_subsystem",
                "initialize_tables",
                "load_tables",
                "enable_subsystem",
                "initialize_objects",
                "terminate",
            ]
        );
        let expected: String = [
            "\\",
            "\\_GPE",
            "\\_PR_",
            "\\_SB_",
            "\\_SI_",
            "\\_S5_",
            "\\_PR_.CPU0",
            "\\_SB_.PCI0",
            "\\_SB_.PCI0.ISA_",
        ]
        .iter()
        .map(|path| alloc::format!("    {}\n", path))
        .collect();
        assert_eq!(driver.osl().platform().console_text(), expected);
        assert!(driver.osl().platform().port_writes().is_empty());
    }

    #[test]
    fn diagnostic_failure_dumps_then_reports() {
        let mut driver = driver(MockInterpreter::failing(
            Step::InitializeObjects,
            Status::AE_AML_OPERAND_TYPE,
        ));
        assert_eq!(driver.run(&dump_options()), -1);

        let console = driver.osl().platform().console_text();
        assert!(console.starts_with("    \\\n    \\_GPE\n"));
        assert!(console.ends_with("acpioff: initialize objects failed: AE_AML_OPERAND_TYPE\n"));
        assert_eq!(console.lines().count(), 10);
    }

    #[test]
    fn diagnostic_sleep_failure_dumps_before_reporting() {
        let mut driver = driver(MockInterpreter::failing(
            Step::EnterSleepState,
            Status::AE_NO_HARDWARE_RESPONSE,
        ));
        assert_eq!(driver.run(&Mode::Diagnostic(Options::default())), -1);

        assert_eq!(driver.interpreter().calls().len(), 8);
        assert_eq!(driver.state(), State::Failed(Step::EnterSleepState));
        let console = driver.osl().platform().console_text();
        let lines: Vec<&str> = console.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "    \\");
        assert_eq!(lines[8], "    \\_SB_.PCI0.ISA_");
        assert_eq!(
            lines[9],
            "acpioff: enter sleep state failed: AE_NO_HARDWARE_RESPONSE"
        );
    }

    #[test]
    fn diagnostic_without_dump_powers_off() {
        let options = Options {
            level: DebugLevel::INIT | DebugLevel::INFO,
            layers: DebugLayer::NAMESPACE,
            dump_namespace: false,
        };
        let mut driver = driver(MockInterpreter::new());
        assert_eq!(driver.run(&Mode::Diagnostic(options)), 0);

        assert_eq!(
            driver.interpreter().debug(),
            Some((DebugLevel::INIT | DebugLevel::INFO, DebugLayer::NAMESPACE))
        );
        assert_eq!(driver.interpreter().calls().len(), 8);
        assert_eq!(driver.osl().platform().port_writes().len(), 1);
    }

    #[test]
    fn dump_before_load_lists_only_the_root() {
        let mut driver = driver(MockInterpreter::new());
        driver.advance(Step::InitializeSubsystem).unwrap();
        assert_eq!(driver.dump_namespace(), Ok(1));
        assert_eq!(driver.osl().platform().console_text(), "    \\\n");
    }
}
