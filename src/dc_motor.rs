// DC MOTOR click — TB6549-style full-bridge driver.
//
// Speed rides on the PWM duty, direction on the two input pins, and the
// standby pin gates the bridge. IN1/IN2 truth table: 10 forward,
// 01 reverse, 00 coast, 11 short brake.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::error::Error;

pub struct DcMotor<PWM, IN1, IN2, SLP> {
    pwm: PWM,
    in1: IN1,
    in2: IN2,
    slp: SLP,
}

impl<PWM, IN1, IN2, SLP, E> DcMotor<PWM, IN1, IN2, SLP>
where
    PWM: SetDutyCycle<Error = E>,
    IN1: OutputPin,
    IN2: OutputPin,
    SLP: OutputPin,
{
    /// Bridge starts awake and coasting at zero duty.
    pub fn new(pwm: PWM, in1: IN1, in2: IN2, mut slp: SLP) -> Result<Self, Error<E>> {
        let _ = slp.set_high();
        let mut motor = Self { pwm, in1, in2, slp };
        motor.coast()?;
        Ok(motor)
    }

    pub fn forward(&mut self, percent: u8) -> Result<(), Error<E>> {
        if percent > 100 {
            return Err(Error::InvalidParam);
        }
        let _ = self.in1.set_high();
        let _ = self.in2.set_low();
        self.pwm.set_duty_cycle_percent(percent)?;
        Ok(())
    }

    pub fn reverse(&mut self, percent: u8) -> Result<(), Error<E>> {
        if percent > 100 {
            return Err(Error::InvalidParam);
        }
        let _ = self.in1.set_low();
        let _ = self.in2.set_high();
        self.pwm.set_duty_cycle_percent(percent)?;
        Ok(())
    }

    /// Outputs high-impedance, motor freewheels.
    pub fn coast(&mut self) -> Result<(), Error<E>> {
        let _ = self.in1.set_low();
        let _ = self.in2.set_low();
        self.pwm.set_duty_cycle_fully_off()?;
        Ok(())
    }

    /// Both low-side FETs on, motor shorted.
    pub fn brake(&mut self) -> Result<(), Error<E>> {
        let _ = self.in1.set_high();
        let _ = self.in2.set_high();
        self.pwm.set_duty_cycle_fully_off()?;
        Ok(())
    }

    /// Put the bridge in standby; wake with [`Self::wake`] before driving.
    pub fn sleep(&mut self) {
        let _ = self.slp.set_low();
    }

    pub fn wake(&mut self) {
        let _ = self.slp.set_high();
    }
}
